//! Database migrations.
//!
//! Schema migrations for the crimewatch database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_account_table;
mod m20260101_000002_create_crime_report_table;
mod m20260101_000003_create_complaint_assignment_table;
mod m20260101_000004_create_report_status_event_table;
mod m20260101_000005_create_chat_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_account_table::Migration),
            Box::new(m20260101_000002_create_crime_report_table::Migration),
            Box::new(m20260101_000003_create_complaint_assignment_table::Migration),
            Box::new(m20260101_000004_create_report_status_event_table::Migration),
            Box::new(m20260101_000005_create_chat_tables::Migration),
        ]
    }
}
