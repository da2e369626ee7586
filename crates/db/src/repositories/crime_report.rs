//! Crime report repository.

use std::sync::Arc;

use crate::entities::{
    CrimeReport,
    crime_report::{self, ReportStatus},
};
use chrono::{DateTime, Utc};
use crimewatch_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    TransactionTrait, sea_query::Expr,
};

/// Crime report repository for database operations.
#[derive(Clone)]
pub struct CrimeReportRepository {
    db: Arc<DatabaseConnection>,
}

impl CrimeReportRepository {
    /// Create a new crime report repository.
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

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<crime_report::Model>> {
        CrimeReport::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<crime_report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Crime report {id} not found")))
    }

    /// Find reports by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<crime_report::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        CrimeReport::find()
            .filter(crime_report::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a report on the given connection (usually a transaction).
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: crime_report::Model,
    ) -> AppResult<crime_report::Model> {
        CrimeReport::insert(model.clone().into_active_model())
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(model)
    }

    /// Compare-and-set the report status.
    ///
    /// Only a row still in `from` is updated; the caller treats zero rows as a
    /// lost race.
    pub async fn transition_status<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        from: ReportStatus,
        to: ReportStatus,
        feedback: Option<&str>,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let mut update = CrimeReport::update_many()
            .col_expr(crime_report::Column::Status, Expr::value(to))
            .col_expr(crime_report::Column::UpdatedAt, Expr::value(at));

        if let Some(f) = feedback {
            update = update.col_expr(crime_report::Column::Feedback, Expr::value(f.to_string()));
        }

        let result = update
            .filter(crime_report::Column::Id.eq(id))
            .filter(crime_report::Column::Status.eq(from))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Lock a pending report for the rest of the transaction.
    ///
    /// Bumps `updated_at` only while the report is still pending. Zero rows
    /// means the report moved on.
    pub async fn touch_pending<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = CrimeReport::update_many()
            .col_expr(crime_report::Column::UpdatedAt, Expr::value(at))
            .filter(crime_report::Column::Id.eq(id))
            .filter(crime_report::Column::Status.eq(ReportStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Set the complaint number unless the report already has one.
    pub async fn assign_complaint_id<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        complaint_id: &str,
    ) -> AppResult<u64> {
        let result = CrimeReport::update_many()
            .col_expr(
                crime_report::Column::ComplaintId,
                Expr::value(complaint_id.to_string()),
            )
            .filter(crime_report::Column::Id.eq(id))
            .filter(crime_report::Column::ComplaintId.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Reports filed by a citizen, newest first.
    pub async fn find_by_reporter(&self, reporter_id: &str) -> AppResult<Vec<crime_report::Model>> {
        CrimeReport::find()
            .filter(crime_report::Column::ReporterId.eq(reporter_id))
            .order_by_desc(crime_report::Column::CreatedAt)
            .order_by_desc(crime_report::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports inside a latitude band and any of the longitude ranges.
    ///
    /// A box crossing the antimeridian is passed as two longitude ranges.
    pub async fn find_in_bounds(
        &self,
        (min_lat, max_lat): (f64, f64),
        lng_ranges: &[(f64, f64)],
    ) -> AppResult<Vec<crime_report::Model>> {
        Self::bounds_query((min_lat, max_lat), lng_ranges)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn bounds_query(
        (min_lat, max_lat): (f64, f64),
        lng_ranges: &[(f64, f64)],
    ) -> Select<CrimeReport> {
        let longitude = lng_ranges
            .iter()
            .fold(Condition::any(), |cond, &(min_lng, max_lng)| {
                cond.add(crime_report::Column::Longitude.between(min_lng, max_lng))
            });

        CrimeReport::find()
            .filter(crime_report::Column::Latitude.between(min_lat, max_lat))
            .filter(longitude)
    }

    /// One page of reports for a pincode, newest first, plus the total count.
    ///
    /// `page` is 1-based.
    pub async fn find_by_pincode_page(
        &self,
        pincode: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<crime_report::Model>, u64)> {
        let paginator = CrimeReport::find()
            .filter(crime_report::Column::Pincode.eq(pincode))
            .order_by_desc(crime_report::Column::CreatedAt)
            .order_by_desc(crime_report::Column::Id)
            .paginate(self.db.as_ref(), per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Distinct pincodes that have at least one report, ascending.
    pub async fn distinct_pincodes(&self) -> AppResult<Vec<String>> {
        CrimeReport::find()
            .select_only()
            .column(crime_report::Column::Pincode)
            .distinct()
            .order_by_asc(crime_report::Column::Pincode)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List reports, optionally filtered by status (newest first).
    pub async fn list(
        &self,
        status: Option<ReportStatus>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<crime_report::Model>> {
        let mut query = CrimeReport::find().order_by_desc(crime_report::Column::CreatedAt);

        if let Some(s) = status {
            query = query.filter(crime_report::Column::Status.eq(s));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every report, oldest first.
    pub async fn all(&self) -> AppResult<Vec<crime_report::Model>> {
        CrimeReport::find()
            .order_by_asc(crime_report::Column::CreatedAt)
            .order_by_asc(crime_report::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports, optionally filtered by status.
    pub async fn count(&self, status: Option<ReportStatus>) -> AppResult<u64> {
        let mut query = CrimeReport::find();

        if let Some(s) = status {
            query = query.filter(crime_report::Column::Status.eq(s));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reports created at or after `since`, oldest first.
    pub async fn find_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<crime_report::Model>> {
        CrimeReport::find()
            .filter(crime_report::Column::CreatedAt.gte(since))
            .order_by_asc(crime_report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Number of reports created at or after `since`.
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> AppResult<u64> {
        CrimeReport::find()
            .filter(crime_report::Column::CreatedAt.gte(since))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Report counts per pincode, busiest first.
    pub async fn count_by_pincode(&self, limit: u64) -> AppResult<Vec<(String, i64)>> {
        use sea_orm::FromQueryResult;

        #[derive(FromQueryResult)]
        struct PincodeCount {
            pincode: String,
            count: i64,
        }

        let rows = CrimeReport::find()
            .select_only()
            .column(crime_report::Column::Pincode)
            .column_as(crime_report::Column::Id.count(), "count")
            .group_by(crime_report::Column::Pincode)
            .order_by_desc(crime_report::Column::Id.count())
            .limit(limit)
            .into_model::<PincodeCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|r| (r.pincode, r.count)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, QueryTrait};

    fn create_test_report(id: &str, pincode: &str) -> crime_report::Model {
        crime_report::Model {
            id: id.to_string(),
            reporter_id: Some("citizen1".to_string()),
            title: "Stolen bicycle".to_string(),
            description: "Taken from the stand".to_string(),
            category: "Theft".to_string(),
            severity: 3,
            latitude: 28.6,
            longitude: 77.2,
            pincode: pincode.to_string(),
            status: ReportStatus::Pending,
            is_anonymous: false,
            complaint_id: None,
            feedback: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn rows(n: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: n,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<crime_report::Model>::new()])
                .into_connection(),
        );

        let repo = CrimeReportRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_returns_model() {
        let report = create_test_report("r1", "110001");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([rows(1)])
            .into_connection();

        let inserted = CrimeReportRepository::insert(&db, report.clone())
            .await
            .unwrap();

        assert_eq!(inserted, report);
    }

    #[tokio::test]
    async fn test_transition_status_lost_race_reports_zero_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([rows(1), rows(0)])
            .into_connection();

        let now = Utc::now();
        let first = CrimeReportRepository::transition_status(
            &db,
            "r1",
            ReportStatus::Investigating,
            ReportStatus::Resolved,
            Some("suspect identified"),
            now,
        )
        .await
        .unwrap();
        let second = CrimeReportRepository::transition_status(
            &db,
            "r1",
            ReportStatus::Investigating,
            ReportStatus::Closed,
            None,
            now,
        )
        .await
        .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_find_by_reporter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_report("r2", "110001"),
                    create_test_report("r1", "110001"),
                ]])
                .into_connection(),
        );

        let repo = CrimeReportRepository::new(db);
        let result = repo.find_by_reporter("citizen1").await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, "r2");
    }

    #[test]
    fn test_bounds_query_ors_longitude_ranges() {
        let sql = CrimeReportRepository::bounds_query(
            (-0.1, 0.1),
            &[(179.9, 180.0), (-180.0, -179.9)],
        )
        .build(DatabaseBackend::Postgres)
        .to_string();

        assert!(sql.contains(" OR "), "{sql}");
        assert_eq!(sql.matches("BETWEEN").count(), 3, "{sql}");
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CrimeReportRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }
}
