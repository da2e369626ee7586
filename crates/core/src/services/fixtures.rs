//! Model builders shared by the service tests.

use chrono::Utc;
use crimewatch_db::entities::{
    account::{self, AccountRole},
    complaint_assignment::{self, AssignmentStatus},
    crime_report::{self, ReportStatus},
};
use sea_orm::MockExecResult;

pub fn account(id: &str, role: AccountRole) -> account::Model {
    account::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_lowercase(),
        email: format!("{id}@example.com"),
        password_hash: String::new(),
        full_name: None,
        role,
        badge_number: None,
        department: None,
        jurisdiction: None,
        phone_number: None,
        is_approved: role != AccountRole::Authority,
        approved_at: None,
        is_blocked: false,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// An approved police authority covering every `110xxx` pincode.
pub fn authority(id: &str) -> account::Model {
    account::Model {
        badge_number: Some(format!("B-{id}")),
        department: Some("Police".to_string()),
        jurisdiction: Some("110".to_string()),
        is_approved: true,
        approved_at: Some(Utc::now().into()),
        ..account(id, AccountRole::Authority)
    }
}

pub fn report(id: &str, status: ReportStatus) -> crime_report::Model {
    crime_report::Model {
        id: id.to_string(),
        reporter_id: Some("citizen1".to_string()),
        title: "Stolen bicycle".to_string(),
        description: "Bicycle taken from the market parking".to_string(),
        category: "Theft".to_string(),
        severity: 3,
        latitude: 28.6,
        longitude: 77.2,
        pincode: "110001".to_string(),
        status,
        is_anonymous: false,
        complaint_id: None,
        feedback: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn assignment(
    id: &str,
    authority_id: &str,
    status: AssignmentStatus,
) -> complaint_assignment::Model {
    complaint_assignment::Model {
        id: id.to_string(),
        report_id: "r1".to_string(),
        authority_id: authority_id.to_string(),
        status,
        assigned_at: Utc::now().into(),
        responded_at: None,
    }
}

pub const fn rows(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}
