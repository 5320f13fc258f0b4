//! Migration: Create forms, sections and fields.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Forms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Forms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Forms::Title).string().not_null())
                    .col(ColumnDef::new(Forms::Description).text().null())
                    .col(
                        ColumnDef::new(Forms::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Forms::Version)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Forms::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Forms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Forms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forms_created_by")
                            .from(Forms::Table, Forms::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FormSections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormSections::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormSections::FormId).uuid().not_null())
                    .col(
                        ColumnDef::new(FormSections::Title)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(FormSections::SortOrder).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_sections_form")
                            .from(FormSections::Table, FormSections::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_sections_form_order")
                    .table(FormSections::Table)
                    .col(FormSections::FormId)
                    .col(FormSections::SortOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FormFields::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FormFields::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FormFields::SectionId).uuid().not_null())
                    .col(ColumnDef::new(FormFields::FormId).uuid().not_null())
                    .col(ColumnDef::new(FormFields::Label).string().not_null())
                    .col(ColumnDef::new(FormFields::FieldType).string().not_null())
                    .col(
                        ColumnDef::new(FormFields::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FormFields::SortOrder).integer().not_null())
                    .col(ColumnDef::new(FormFields::Placeholder).string().null())
                    .col(ColumnDef::new(FormFields::Options).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_fields_section")
                            .from(FormFields::Table, FormFields::SectionId)
                            .to(FormSections::Table, FormSections::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_form_fields_form")
                            .from(FormFields::Table, FormFields::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_fields_section_order")
                    .table(FormFields::Table)
                    .col(FormFields::SectionId)
                    .col(FormFields::SortOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_form_fields_form_id")
                    .table(FormFields::Table)
                    .col(FormFields::FormId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FormFields::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FormSections::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Forms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Forms {
    Table,
    Id,
    Title,
    Description,
    IsActive,
    Version,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum FormSections {
    Table,
    Id,
    FormId,
    Title,
    SortOrder,
}

#[derive(Iden)]
enum FormFields {
    Table,
    Id,
    SectionId,
    FormId,
    Label,
    FieldType,
    Required,
    SortOrder,
    Placeholder,
    Options,
}
