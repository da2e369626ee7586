//! Create `crime_report` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrimeReport::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrimeReport::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrimeReport::ReporterId).string_len(32))
                    .col(ColumnDef::new(CrimeReport::Title).string_len(200).not_null())
                    .col(ColumnDef::new(CrimeReport::Description).text().not_null())
                    .col(ColumnDef::new(CrimeReport::Category).string_len(50).not_null())
                    .col(
                        ColumnDef::new(CrimeReport::Severity)
                            .small_integer()
                            .not_null()
                            .default(3),
                    )
                    .col(ColumnDef::new(CrimeReport::Latitude).double().not_null())
                    .col(ColumnDef::new(CrimeReport::Longitude).double().not_null())
                    .col(ColumnDef::new(CrimeReport::Pincode).string_len(6).not_null())
                    .col(
                        ColumnDef::new(CrimeReport::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(CrimeReport::IsAnonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(CrimeReport::ComplaintId)
                            .string_len(20)
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CrimeReport::Feedback).text())
                    .col(
                        ColumnDef::new(CrimeReport::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(CrimeReport::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crime_report_reporter")
                            .from(CrimeReport::Table, CrimeReport::ReporterId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crime_report_reporter_id")
                    .table(CrimeReport::Table)
                    .col(CrimeReport::ReporterId)
                    .to_owned(),
            )
            .await?;

        // Composite index for pincode listings (newest first)
        manager
            .create_index(
                Index::create()
                    .name("idx_crime_report_pincode_created_at")
                    .table(CrimeReport::Table)
                    .col(CrimeReport::Pincode)
                    .col(CrimeReport::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: coordinates for the nearby bounding-box prefilter
        manager
            .create_index(
                Index::create()
                    .name("idx_crime_report_location")
                    .table(CrimeReport::Table)
                    .col(CrimeReport::Latitude)
                    .col(CrimeReport::Longitude)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crime_report_status")
                    .table(CrimeReport::Table)
                    .col(CrimeReport::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CrimeReport::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CrimeReport {
    Table,
    Id,
    ReporterId,
    Title,
    Description,
    Category,
    Severity,
    Latitude,
    Longitude,
    Pincode,
    Status,
    IsAnonymous,
    ComplaintId,
    Feedback,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Account {
    Table,
    Id,
}
