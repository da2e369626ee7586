//! Create `account` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Account::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Account::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Account::Username)
                            .string_len(80)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Account::UsernameLower)
                            .string_len(80)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Account::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Account::PasswordHash).string_len(255).not_null())
                    .col(ColumnDef::new(Account::FullName).string_len(128))
                    .col(
                        ColumnDef::new(Account::Role)
                            .string_len(16)
                            .not_null()
                            .default("citizen"),
                    )
                    .col(ColumnDef::new(Account::BadgeNumber).string_len(64).unique_key())
                    .col(ColumnDef::new(Account::Department).string_len(128))
                    .col(ColumnDef::new(Account::Jurisdiction).string_len(64))
                    .col(ColumnDef::new(Account::PhoneNumber).string_len(20))
                    .col(
                        ColumnDef::new(Account::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Account::ApprovedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Account::IsBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Account::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Account::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: role for admin listings and routing
        manager
            .create_index(
                Index::create()
                    .name("idx_account_role")
                    .table(Account::Table)
                    .col(Account::Role)
                    .col(Account::IsApproved)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Account::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
    Username,
    UsernameLower,
    Email,
    PasswordHash,
    FullName,
    Role,
    BadgeNumber,
    Department,
    Jurisdiction,
    PhoneNumber,
    IsApproved,
    ApprovedAt,
    IsBlocked,
    CreatedAt,
    UpdatedAt,
}
