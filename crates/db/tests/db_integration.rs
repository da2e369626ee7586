//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p crimewatch-db --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `crimewatch_test`)
//!   `TEST_DB_PASSWORD` (default: `crimewatch_test`)
//!   `TEST_DB_NAME` (default: `crimewatch_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use crimewatch_db::{
    entities::{
        account::{self, AccountRole},
        complaint_assignment::{self, AssignmentStatus},
        crime_report::{self, ReportStatus},
    },
    repositories::{AccountRepository, ComplaintRepository, CrimeReportRepository},
    test_utils::TestDatabase,
};
use sea_orm::{IntoActiveModel, SqlxPostgresConnector, TransactionTrait};

fn account(id: &str, role: AccountRole) -> account::Model {
    account::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_lowercase(),
        email: format!("{id}@example.com"),
        password_hash: "x".to_string(),
        full_name: None,
        role,
        badge_number: None,
        department: Some("Police".to_string()),
        jurisdiction: Some("110".to_string()),
        phone_number: None,
        is_approved: true,
        approved_at: None,
        is_blocked: false,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn report(id: &str, reporter: &str) -> crime_report::Model {
    crime_report::Model {
        id: id.to_string(),
        reporter_id: Some(reporter.to_string()),
        title: "Untitled Report".to_string(),
        description: "Phone snatched".to_string(),
        category: "Theft".to_string(),
        severity: 3,
        latitude: 28.6,
        longitude: 77.2,
        pincode: "110001".to_string(),
        status: ReportStatus::Pending,
        is_anonymous: false,
        complaint_id: None,
        feedback: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_unique_assignment_pair_enforced() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));

    let accounts = AccountRepository::new(conn.clone());
    accounts
        .create(account("citizen1", AccountRole::Citizen).into_active_model())
        .await
        .unwrap();
    accounts
        .create(account("officer1", AccountRole::Authority).into_active_model())
        .await
        .unwrap();
    CrimeReportRepository::insert(conn.as_ref(), report("r1", "citizen1"))
        .await
        .unwrap();

    let assignment = complaint_assignment::Model {
        id: "a1".to_string(),
        report_id: "r1".to_string(),
        authority_id: "officer1".to_string(),
        status: AssignmentStatus::Pending,
        assigned_at: Utc::now().into(),
        responded_at: None,
    };
    ComplaintRepository::insert(conn.as_ref(), assignment.clone())
        .await
        .unwrap();

    let duplicate = complaint_assignment::Model {
        id: "a2".to_string(),
        ..assignment
    };
    assert!(ComplaintRepository::insert(conn.as_ref(), duplicate).await.is_err());

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_compare_and_set_respond_in_transaction() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    let conn = Arc::new(SqlxPostgresConnector::from_sqlx_postgres_pool(
        db.conn.get_postgres_connection_pool().clone(),
    ));

    let accounts = AccountRepository::new(conn.clone());
    accounts
        .create(account("citizen1", AccountRole::Citizen).into_active_model())
        .await
        .unwrap();
    accounts
        .create(account("officer1", AccountRole::Authority).into_active_model())
        .await
        .unwrap();
    CrimeReportRepository::insert(conn.as_ref(), report("r1", "citizen1"))
        .await
        .unwrap();
    ComplaintRepository::insert(
        conn.as_ref(),
        complaint_assignment::Model {
            id: "a1".to_string(),
            report_id: "r1".to_string(),
            authority_id: "officer1".to_string(),
            status: AssignmentStatus::Pending,
            assigned_at: Utc::now().into(),
            responded_at: None,
        },
    )
    .await
    .unwrap();

    let txn = conn.begin().await.unwrap();
    let now = Utc::now();
    let won = ComplaintRepository::respond(&txn, "a1", AssignmentStatus::Accepted, now)
        .await
        .unwrap();
    let moved = CrimeReportRepository::transition_status(
        &txn,
        "r1",
        ReportStatus::Pending,
        ReportStatus::Investigating,
        None,
        now,
    )
    .await
    .unwrap();
    txn.commit().await.unwrap();

    assert_eq!((won, moved), (1, 1));

    let lost = ComplaintRepository::respond(conn.as_ref(), "a1", AssignmentStatus::Rejected, now)
        .await
        .unwrap();
    assert_eq!(lost, 0);

    let stored = ComplaintRepository::new(conn.clone())
        .get_by_id("a1")
        .await
        .unwrap();
    assert_eq!(stored.status, AssignmentStatus::Accepted);
    assert!(stored.responded_at.is_some());

    db.drop_database().await.unwrap();
}
