//! Crime report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Crime report status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ReportStatus {
    #[sea_orm(string_value = "pending")]
    #[default]
    Pending,
    #[sea_orm(string_value = "investigating")]
    Investigating,
    #[sea_orm(string_value = "resolved")]
    Resolved,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl ReportStatus {
    /// Wire/storage name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Statuses reachable from this one in a single step.
    ///
    /// `pending -> investigating` happens when an authority accepts an
    /// assignment, or by an admin while nobody holds the report. `closed`
    /// has no outgoing edges.
    #[must_use]
    pub const fn successors(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Investigating],
            Self::Investigating => &[Self::Resolved, Self::Closed],
            Self::Resolved => &[Self::Closed],
            Self::Closed => &[],
        }
    }

    /// Whether `next` is a legal edge out of this status. Self-loops are not.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    /// Whether no further status change is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "investigating" => Ok(Self::Investigating),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(format!(
                "Invalid status '{other}'. Must be one of: pending, investigating, resolved, closed"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "crime_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Reporting citizen; NULL for anonymous reports
    #[sea_orm(nullable, indexed)]
    pub reporter_id: Option<String>,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub category: String,

    /// 1 (minor) to 5 (critical emergency)
    pub severity: i16,

    pub latitude: f64,

    pub longitude: f64,

    #[sea_orm(indexed)]
    pub pincode: String,

    pub status: ReportStatus,

    #[sea_orm(default_value = false)]
    pub is_anonymous: bool,

    /// Set when the report is first routed to an authority
    #[sea_orm(unique, nullable)]
    pub complaint_id: Option<String>,

    /// Latest note left with a status update
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::ReporterId",
        to = "super::account::Column::Id"
    )]
    Reporter,

    #[sea_orm(has_many = "super::complaint_assignment::Entity")]
    Assignments,

    #[sea_orm(has_many = "super::report_status_event::Entity")]
    StatusEvents,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl Related<super::complaint_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::report_status_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
