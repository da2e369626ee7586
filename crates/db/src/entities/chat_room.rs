//! Chat room entity: one conversation per crime report.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_room")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub report_id: String,

    /// Reporting citizen; NULL when the report is anonymous
    #[sea_orm(nullable, indexed)]
    pub citizen_id: Option<String>,

    /// Authority holding the active assignment when the room was opened
    #[sea_orm(nullable, indexed)]
    pub authority_id: Option<String>,

    #[sea_orm(nullable)]
    pub complaint_id: Option<String>,

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

    #[sea_orm(has_many = "super::chat_message::Entity")]
    Messages,
}

impl Related<super::crime_report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl Related<super::chat_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
