//! Create `complaint_assignment` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComplaintAssignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintAssignment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::ReportId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::AuthorityId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ComplaintAssignment::RespondedAt)
                            .timestamp_with_time_zone(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_assignment_report")
                            .from(ComplaintAssignment::Table, ComplaintAssignment::ReportId)
                            .to(CrimeReport::Table, CrimeReport::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_assignment_authority")
                            .from(ComplaintAssignment::Table, ComplaintAssignment::AuthorityId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // An authority is offered a given report at most once
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_assignment_report_authority")
                    .table(ComplaintAssignment::Table)
                    .col(ComplaintAssignment::ReportId)
                    .col(ComplaintAssignment::AuthorityId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: authority inbox
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_assignment_authority_status")
                    .table(ComplaintAssignment::Table)
                    .col(ComplaintAssignment::AuthorityId)
                    .col(ComplaintAssignment::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ComplaintAssignment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ComplaintAssignment {
    Table,
    Id,
    ReportId,
    AuthorityId,
    Status,
    AssignedAt,
    RespondedAt,
}

#[derive(Iden)]
enum CrimeReport {
    Table,
    Id,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
