//! Create society_reset_passwords table migration

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SocietyResetPasswords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SocietyResetPasswords::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SocietyResetPasswords::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(SocietyResetPasswords::Code)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocietyResetPasswords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SocietyResetPasswords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups go by (code, email)
        manager
            .create_index(
                Index::create()
                    .name("idx_society_reset_passwords_code")
                    .table(SocietyResetPasswords::Table)
                    .col(SocietyResetPasswords::Code)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SocietyResetPasswords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum SocietyResetPasswords {
    Table,
    Id,
    Email,
    Code,
    ExpiresAt,
    CreatedAt,
}
