//! Aggregate views for the admin console and the authority dashboard.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use crimewatch_common::{AppError, AppResult};
use crimewatch_db::{
    entities::{
        account::{self, AccountRole},
        crime_report::{self, ReportStatus},
    },
    repositories::{AccountRepository, CrimeReportRepository},
};
use serde::{Deserialize, Serialize};

/// Severity at or above which a report counts as critical.
pub const CRITICAL_SEVERITY: i16 = 4;
pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const DASHBOARD_RECENT_LIMIT: u64 = 10;
pub const DEFAULT_ACTIVE_AREAS: u64 = 10;
pub const MAX_ACTIVE_AREAS: u64 = 100;

/// Analytics window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Year,
}

impl TimeRange {
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }
}

impl std::str::FromStr for TimeRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(AppError::Validation(format!(
                "time_range: '{other}' is not one of week, month, year"
            ))),
        }
    }
}

/// Admin landing page counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub user_count: u64,
    pub authority_count: u64,
    pub report_count: u64,
    /// Reports filed in the last seven days.
    pub recent_reports: u64,
    pub pending_authority_requests: u64,
}

/// A labelled count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket<K> {
    pub key: K,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrimeAnalytics {
    pub time_range: TimeRange,
    pub total_reports: u64,
    pub solved_cases: u64,
    pub pending_cases: u64,
    pub critical_cases: u64,
    pub crimes_by_type: Vec<Bucket<String>>,
    pub crimes_by_status: Vec<Bucket<ReportStatus>>,
    pub crimes_by_severity: Vec<Bucket<i16>>,
    /// Reports per hour of day (UTC), 0 to 23.
    pub crimes_by_hour: Vec<Bucket<u32>>,
}

/// Reports per pincode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveArea {
    pub pincode: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorityDashboard {
    pub total_crimes: u64,
    pub pending_crimes: u64,
    pub investigating_crimes: u64,
    pub resolved_crimes: u64,
    pub recent_crimes: Vec<crime_report::Model>,
    pub jurisdiction: Option<String>,
}

fn buckets<K: Ord>(counts: BTreeMap<K, u64>) -> Vec<Bucket<K>> {
    counts
        .into_iter()
        .map(|(key, count)| Bucket { key, count })
        .collect()
}

/// Fold a window of reports into the analytics summary.
#[must_use]
pub fn summarize(time_range: TimeRange, reports: &[crime_report::Model]) -> CrimeAnalytics {
    use chrono::Timelike;

    let mut by_type: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_status: BTreeMap<&'static str, (ReportStatus, u64)> = BTreeMap::new();
    let mut by_severity: BTreeMap<i16, u64> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, u64> = BTreeMap::new();

    for report in reports {
        *by_type.entry(report.category.clone()).or_default() += 1;
        by_status
            .entry(report.status.as_str())
            .or_insert((report.status, 0))
            .1 += 1;
        *by_severity.entry(report.severity).or_default() += 1;
        *by_hour
            .entry(report.created_at.with_timezone(&Utc).hour())
            .or_default() += 1;
    }

    let count_status = |status: ReportStatus| {
        by_status
            .get(status.as_str())
            .map_or(0, |(_, count)| *count)
    };

    CrimeAnalytics {
        time_range,
        total_reports: reports.len() as u64,
        solved_cases: count_status(ReportStatus::Resolved),
        pending_cases: count_status(ReportStatus::Pending),
        critical_cases: reports
            .iter()
            .filter(|r| r.severity >= CRITICAL_SEVERITY)
            .count() as u64,
        crimes_by_type: buckets(by_type),
        crimes_by_status: by_status
            .into_values()
            .map(|(key, count)| Bucket { key, count })
            .collect(),
        crimes_by_severity: buckets(by_severity),
        crimes_by_hour: buckets(by_hour),
    }
}

/// Analytics service.
#[derive(Clone)]
pub struct AnalyticsService {
    report_repo: CrimeReportRepository,
    account_repo: AccountRepository,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(report_repo: CrimeReportRepository, account_repo: AccountRepository) -> Self {
        Self {
            report_repo,
            account_repo,
        }
    }

    /// Counters for the admin dashboard.
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);

        Ok(DashboardStats {
            user_count: self.account_repo.count(Some(AccountRole::Citizen)).await?,
            authority_count: self.account_repo.count(Some(AccountRole::Authority)).await?,
            report_count: self.report_repo.count(None).await?,
            recent_reports: self.report_repo.count_created_since(since).await?,
            pending_authority_requests: self.account_repo.count_pending_authorities().await?,
        })
    }

    /// Breakdown of the reports filed inside a window.
    pub async fn crime_analytics(&self, time_range: TimeRange) -> AppResult<CrimeAnalytics> {
        let since = Utc::now() - Duration::days(time_range.days());
        let reports = self.report_repo.find_created_since(since).await?;

        tracing::debug!(
            range = ?time_range,
            reports = reports.len(),
            "Computed crime analytics"
        );

        Ok(summarize(time_range, &reports))
    }

    /// Pincodes with the most reports.
    pub async fn active_areas(&self, limit: Option<u64>) -> AppResult<Vec<ActiveArea>> {
        let limit = limit.unwrap_or(DEFAULT_ACTIVE_AREAS).clamp(1, MAX_ACTIVE_AREAS);

        Ok(self
            .report_repo
            .count_by_pincode(limit)
            .await?
            .into_iter()
            .map(|(pincode, count)| ActiveArea {
                pincode,
                count: u64::try_from(count).unwrap_or(0),
            })
            .collect())
    }

    /// Status counters and the latest reports for an authority.
    pub async fn authority_dashboard(
        &self,
        authority: &account::Model,
    ) -> AppResult<AuthorityDashboard> {
        Ok(AuthorityDashboard {
            total_crimes: self.report_repo.count(None).await?,
            pending_crimes: self.report_repo.count(Some(ReportStatus::Pending)).await?,
            investigating_crimes: self
                .report_repo
                .count(Some(ReportStatus::Investigating))
                .await?,
            resolved_crimes: self.report_repo.count(Some(ReportStatus::Resolved)).await?,
            recent_crimes: self
                .report_repo
                .list(None, DASHBOARD_RECENT_LIMIT, 0)
                .await?,
            jurisdiction: authority.jurisdiction.clone(),
        })
    }
}
