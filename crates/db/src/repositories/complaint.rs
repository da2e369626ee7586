//! Complaint assignment repository.

use std::sync::Arc;

use crate::entities::{
    ComplaintAssignment,
    complaint_assignment::{self, AssignmentStatus},
};
use chrono::{DateTime, Utc};
use crimewatch_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait, sea_query::Expr,
};

/// Complaint assignment repository for database operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Start a transaction on the underlying connection.
    pub async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an assignment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint_assignment::Model>> {
        ComplaintAssignment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an assignment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<complaint_assignment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {id} not found")))
    }

    /// Every assignment ever made for a report, oldest first.
    pub async fn find_for_report<C: ConnectionTrait>(
        conn: &C,
        report_id: &str,
    ) -> AppResult<Vec<complaint_assignment::Model>> {
        ComplaintAssignment::find()
            .filter(complaint_assignment::Column::ReportId.eq(report_id))
            .order_by_asc(complaint_assignment::Column::AssignedAt)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every assignment ever made for a report, on the shared connection.
    pub async fn history_for_report(
        &self,
        report_id: &str,
    ) -> AppResult<Vec<complaint_assignment::Model>> {
        Self::find_for_report(self.db.as_ref(), report_id).await
    }

    /// The assignment currently holding a report (pending or accepted), if any.
    pub async fn find_active_for_report(
        &self,
        report_id: &str,
    ) -> AppResult<Option<complaint_assignment::Model>> {
        ComplaintAssignment::find()
            .filter(complaint_assignment::Column::ReportId.eq(report_id))
            .filter(complaint_assignment::Column::Status.ne(AssignmentStatus::Rejected))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active assignments for several reports at once.
    pub async fn find_active_for_reports(
        &self,
        report_ids: &[String],
    ) -> AppResult<Vec<complaint_assignment::Model>> {
        if report_ids.is_empty() {
            return Ok(vec![]);
        }

        ComplaintAssignment::find()
            .filter(complaint_assignment::Column::ReportId.is_in(report_ids.to_vec()))
            .filter(complaint_assignment::Column::Status.ne(AssignmentStatus::Rejected))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// An authority's queue, newest first.
    ///
    /// Without a status filter the queue holds the active (pending or
    /// accepted) assignments; rejected ones only show up when asked for.
    pub async fn find_for_authority(
        &self,
        authority_id: &str,
        status: Option<AssignmentStatus>,
    ) -> AppResult<Vec<complaint_assignment::Model>> {
        Self::authority_queue(authority_id, status)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn authority_queue(
        authority_id: &str,
        status: Option<AssignmentStatus>,
    ) -> Select<ComplaintAssignment> {
        let status_filter = match status {
            Some(s) => complaint_assignment::Column::Status.eq(s),
            None => complaint_assignment::Column::Status.ne(AssignmentStatus::Rejected),
        };

        ComplaintAssignment::find()
            .filter(complaint_assignment::Column::AuthorityId.eq(authority_id))
            .filter(status_filter)
            .order_by_desc(complaint_assignment::Column::AssignedAt)
    }

    /// All assignments, newest first, optionally by status.
    pub async fn list(
        &self,
        status: Option<AssignmentStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<complaint_assignment::Model>> {
        let mut query =
            ComplaintAssignment::find().order_by_desc(complaint_assignment::Column::AssignedAt);

        if let Some(s) = status {
            query = query.filter(complaint_assignment::Column::Status.eq(s));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count assignments, optionally by status.
    pub async fn count(&self, status: Option<AssignmentStatus>) -> AppResult<u64> {
        let mut query = ComplaintAssignment::find();

        if let Some(s) = status {
            query = query.filter(complaint_assignment::Column::Status.eq(s));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an assignment on the given connection.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: complaint_assignment::Model,
    ) -> AppResult<complaint_assignment::Model> {
        ComplaintAssignment::insert(model.clone().into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(model)
    }

    /// Record an authority's answer.
    ///
    /// Compare-and-set on `status = pending`: of two concurrent responders
    /// exactly one sees a non-zero row count.
    pub async fn respond<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        status: AssignmentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = ComplaintAssignment::update_many()
            .col_expr(complaint_assignment::Column::Status, Expr::value(status))
            .col_expr(complaint_assignment::Column::RespondedAt, Expr::value(at))
            .filter(complaint_assignment::Column::Id.eq(id))
            .filter(complaint_assignment::Column::Status.eq(AssignmentStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
