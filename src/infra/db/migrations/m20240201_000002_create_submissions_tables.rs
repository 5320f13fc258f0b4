//! Migration: Create submissions and their answers.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_users_table::Users;
use super::m20240201_000001_create_forms_tables::Forms;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Submissions::UserId).uuid().not_null())
                    .col(ColumnDef::new(Submissions::FormId).uuid().not_null())
                    .col(
                        ColumnDef::new(Submissions::SubmittedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_user")
                            .from(Submissions::Table, Submissions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submissions_form")
                            .from(Submissions::Table, Submissions::FormId)
                            .to(Forms::Table, Forms::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // One submission per user across every form
        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_user_id")
                    .table(Submissions::Table)
                    .col(Submissions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_form_id")
                    .table(Submissions::Table)
                    .col(Submissions::FormId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubmissionAnswers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubmissionAnswers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAnswers::SubmissionId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SubmissionAnswers::FieldId).uuid().not_null())
                    .col(ColumnDef::new(SubmissionAnswers::Value).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_submission_answers_submission")
                            .from(SubmissionAnswers::Table, SubmissionAnswers::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submission_answers_field_id")
                    .table(SubmissionAnswers::Table)
                    .col(SubmissionAnswers::FieldId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubmissionAnswers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Submissions {
    Table,
    Id,
    UserId,
    FormId,
    SubmittedAt,
}

#[derive(Iden)]
enum SubmissionAnswers {
    Table,
    Id,
    SubmissionId,
    FieldId,
    Value,
}
