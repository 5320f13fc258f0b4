//! Migration: Create pending activation codes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivationOtps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivationOtps::Email)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivationOtps::CodeHash).string().not_null())
                    .col(
                        ColumnDef::new(ActivationOtps::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivationOtps::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ActivationOtps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivationOtps::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ActivationOtps {
    Table,
    Email,
    CodeHash,
    ExpiresAt,
    Attempts,
    CreatedAt,
}
