//! Report status event entity: append-only audit trail of report transitions.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::crime_report::ReportStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report_status_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub report_id: String,

    /// NULL for the creation event
    #[sea_orm(nullable)]
    pub from_status: Option<ReportStatus>,

    pub to_status: ReportStatus,

    /// Account that caused the transition; NULL for anonymous submissions
    #[sea_orm(nullable)]
    pub actor_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::crime_report::Entity",
        from = "Column::ReportId",
        to = "super::crime_report::Column::Id"
    )]
    Report,
}

impl Related<super::crime_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
