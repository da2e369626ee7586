//! Create `report_status_event` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReportStatusEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportStatusEvent::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReportStatusEvent::ReportId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportStatusEvent::FromStatus).string_len(20))
                    .col(
                        ColumnDef::new(ReportStatusEvent::ToStatus)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportStatusEvent::ActorId).string_len(32))
                    .col(ColumnDef::new(ReportStatusEvent::Feedback).text())
                    .col(
                        ColumnDef::new(ReportStatusEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_report_status_event_report")
                            .from(ReportStatusEvent::Table, ReportStatusEvent::ReportId)
                            .to(CrimeReport::Table, CrimeReport::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_status_event_report_created_at")
                    .table(ReportStatusEvent::Table)
                    .col(ReportStatusEvent::ReportId)
                    .col(ReportStatusEvent::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportStatusEvent::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ReportStatusEvent {
    Table,
    Id,
    ReportId,
    FromStatus,
    ToStatus,
    ActorId,
    Feedback,
    CreatedAt,
}

#[derive(Iden)]
enum CrimeReport {
    Table,
    Id,
}
