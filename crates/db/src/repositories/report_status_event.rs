//! Report status event repository (audit trail).

use std::sync::Arc;

use crate::entities::{ReportStatusEvent, report_status_event};
use crimewatch_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};

/// Repository for the append-only report status trail.
#[derive(Clone)]
pub struct StatusEventRepository {
    db: Arc<DatabaseConnection>,
}

impl StatusEventRepository {
    /// Create a new status event repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an event on the given connection, normally the transaction
    /// that applied the transition.
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        event: report_status_event::Model,
    ) -> AppResult<report_status_event::Model> {
        ReportStatusEvent::insert(event.clone().into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(event)
    }

    /// Events for a report in the order they happened.
    pub async fn find_for_report(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<report_status_event::Model>> {
        ReportStatusEvent::find()
            .filter(report_status_event::Column::ReportId.eq(report_id))
            .order_by_asc(report_status_event::Column::CreatedAt)
            .order_by_asc(report_status_event::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::crime_report::ReportStatus;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn event(id: &str, from: Option<ReportStatus>, to: ReportStatus) -> report_status_event::Model {
        report_status_event::Model {
            id: id.to_string(),
            report_id: "r1".to_string(),
            from_status: from,
            to_status: to,
            actor_id: Some("auth1".to_string()),
            feedback: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_for_report_keeps_order() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    event("e1", None, ReportStatus::Pending),
                    event(
                        "e2",
                        Some(ReportStatus::Pending),
                        ReportStatus::Investigating,
                    ),
                ]])
                .into_connection(),
        );

        let repo = StatusEventRepository::new(db);
        let trail = repo.find_for_report("r1").await.unwrap();

        assert_eq!(trail.len(), 2);
        assert!(trail[0].from_status.is_none());
        assert_eq!(trail[1].to_status, ReportStatus::Investigating);
    }
}
