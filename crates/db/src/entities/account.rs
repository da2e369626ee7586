//! Account entity (citizens, authorities and admins).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum AccountRole {
    #[sea_orm(string_value = "citizen")]
    #[default]
    Citizen,
    #[sea_orm(string_value = "authority")]
    Authority,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl AccountRole {
    /// Wire/storage name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Authority => "authority",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "citizen" | "user" => Ok(Self::Citizen),
            "authority" => Ok(Self::Authority),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "account")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub username_lower: String,

    /// Stored lowercase.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[sea_orm(nullable)]
    pub full_name: Option<String>,

    pub role: AccountRole,

    /// Authority badge number
    #[sea_orm(unique, nullable)]
    pub badge_number: Option<String>,

    /// Authority department, e.g. "Police" or "Cyber Cell"
    #[sea_orm(nullable)]
    pub department: Option<String>,

    /// Authority jurisdiction tag: a pincode, a pincode prefix, or `*`
    #[sea_orm(nullable)]
    pub jurisdiction: Option<String>,

    #[sea_orm(nullable)]
    pub phone_number: Option<String>,

    /// Authorities start unapproved; every other role is approved on creation.
    #[sea_orm(default_value = false)]
    pub is_approved: bool,

    #[sea_orm(nullable)]
    pub approved_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(default_value = false)]
    pub is_blocked: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this account is an authority that may act on complaints.
    #[must_use]
    pub fn is_active_authority(&self) -> bool {
        self.role == AccountRole::Authority && self.is_approved && !self.is_blocked
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::crime_report::Entity")]
    Reports,

    #[sea_orm(has_many = "super::complaint_assignment::Entity")]
    Assignments,
}

impl Related<super::crime_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl Related<super::complaint_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
