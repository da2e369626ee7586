//! Crime report service: submission, geo lookup and pincode browsing.

use chrono::Utc;
use crimewatch_common::{AppError, AppResult, IdGenerator};
use crimewatch_db::{
    entities::{
        account::{self, AccountRole},
        crime_report::{self, ReportStatus},
        report_status_event,
    },
    repositories::{CrimeReportRepository, StatusEventRepository},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::complaint::{AssignmentOutcome, ComplaintService};

/// Report categories accepted at submission, in canonical spelling.
pub const CATEGORIES: [&str; 10] = [
    "Theft",
    "Assault",
    "Vandalism",
    "Fraud",
    "Harassment",
    "Traffic Violation",
    "Domestic Violence",
    "Robbery",
    "Burglary",
    "Other",
];

pub const DEFAULT_SEVERITY: i16 = 3;
pub const DEFAULT_TITLE: &str = "Untitled Report";
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

pub const DEFAULT_RADIUS_KM: f64 = 5.0;
pub const MAX_RADIUS_KM: f64 = 50.0;
pub const DEFAULT_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 100;

const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_PER_DEGREE: f64 = 111.32;

/// Canonical spelling of a category, matched case-insensitively.
#[must_use]
pub fn canonical_category(input: &str) -> Option<&'static str> {
    let input = input.trim();
    CATEGORIES
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(input))
}

/// Whether a string is a 6-digit pincode.
#[must_use]
pub fn is_valid_pincode(pincode: &str) -> bool {
    pincode.len() == 6 && pincode.bytes().all(|b| b.is_ascii_digit())
}

/// Great-circle distance in kilometres.
#[must_use]
pub fn haversine_km((lat1, lng1): (f64, f64), (lat2, lng2): (f64, f64)) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Longitude ranges covering `lng ± d_lng`, split in two where the span
/// crosses the antimeridian.
#[must_use]
pub fn longitude_ranges(lng: f64, d_lng: f64) -> Vec<(f64, f64)> {
    if d_lng >= 180.0 {
        return vec![(-180.0, 180.0)];
    }

    let (lo, hi) = (lng - d_lng, lng + d_lng);
    if lo < -180.0 {
        vec![(lo + 360.0, 180.0), (-180.0, hi)]
    } else if hi > 180.0 {
        vec![(lo, 180.0), (-180.0, hi - 360.0)]
    } else {
        vec![(lo, hi)]
    }
}

fn check_coordinates(lat: f64, lng: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err("latitude: must be between -90 and 90".to_string());
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err("longitude: must be between -180 and 180".to_string());
    }
    Ok(())
}

/// Report submission form. Every field is optional on the wire so that all
/// missing fields can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateReportInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub severity: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub pincode: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// A submission that passed validation.
#[derive(Debug, Clone)]
struct ValidReport {
    title: String,
    description: String,
    category: &'static str,
    severity: i16,
    latitude: f64,
    longitude: f64,
    pincode: String,
}

impl CreateReportInput {
    fn present(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Batch validation: all missing fields first, then all format errors.
    fn validate(&self) -> AppResult<ValidReport> {
        let description = Self::present(self.description.as_deref());
        let category = Self::present(self.category.as_deref());
        let pincode = Self::present(self.pincode.as_deref());

        let missing: Vec<String> = [
            ("category", category.is_none()),
            ("description", description.is_none()),
            ("pincode", pincode.is_none()),
            ("latitude", self.latitude.is_none()),
            ("longitude", self.longitude.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| field.to_string())
        .collect();

        let (
            Some(description),
            Some(category),
            Some(pincode),
            Some(latitude),
            Some(longitude),
        ) = (description, category, pincode, self.latitude, self.longitude)
        else {
            return Err(AppError::MissingFields(missing));
        };

        let title = Self::present(self.title.as_deref()).unwrap_or(DEFAULT_TITLE);
        let mut errors = Vec::new();

        let canonical = canonical_category(category);
        if canonical.is_none() {
            errors.push(format!(
                "category: '{category}' is not one of {}",
                CATEGORIES.join(", ")
            ));
        }
        if !is_valid_pincode(pincode) {
            errors.push("pincode: must be exactly 6 digits".to_string());
        }
        if let Err(e) = check_coordinates(latitude, longitude) {
            errors.push(e);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            errors.push(format!("title: at most {MAX_TITLE_LEN} characters"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            errors.push(format!(
                "description: at most {MAX_DESCRIPTION_LEN} characters"
            ));
        }

        match canonical {
            Some(category) if errors.is_empty() => Ok(ValidReport {
                title: title.to_string(),
                description: description.to_string(),
                category,
                severity: normalize_severity(self.severity),
                latitude,
                longitude,
                pincode: pincode.to_string(),
            }),
            _ => Err(AppError::Validation(errors.join("; "))),
        }
    }
}

/// Severity clamped into `1..=5`, defaulting to 3.
#[must_use]
pub fn normalize_severity(severity: Option<i64>) -> i16 {
    severity.map_or(DEFAULT_SEVERITY, |s| {
        i16::try_from(s.clamp(1, 5)).unwrap_or(DEFAULT_SEVERITY)
    })
}

/// A stored report plus the routing result.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedReport {
    #[serde(flatten)]
    pub report: crime_report::Model,
    pub assigned_authority_id: Option<String>,
}

/// A report with its distance from the query point.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyReport {
    #[serde(flatten)]
    pub report: crime_report::Model,
    pub distance_km: f64,
}

/// One page of a pincode listing.
#[derive(Debug, Clone, Serialize)]
pub struct PincodePage {
    pub crimes: Vec<crime_report::Model>,
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
}

/// Crime report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: CrimeReportRepository,
    complaint_service: ComplaintService,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(report_repo: CrimeReportRepository, complaint_service: ComplaintService) -> Self {
        Self {
            report_repo,
            complaint_service,
            id_gen: IdGenerator::new(),
        }
    }

    /// File a new report, then try to route it to an authority.
    pub async fn create(
        &self,
        reporter: &account::Model,
        input: CreateReportInput,
    ) -> AppResult<CreatedReport> {
        let valid = input.validate()?;
        let now = Utc::now();

        let report = crime_report::Model {
            id: self.id_gen.generate(),
            reporter_id: (!input.is_anonymous).then(|| reporter.id.clone()),
            title: valid.title,
            description: valid.description,
            category: valid.category.to_string(),
            severity: valid.severity,
            latitude: valid.latitude,
            longitude: valid.longitude,
            pincode: valid.pincode,
            status: ReportStatus::Pending,
            is_anonymous: input.is_anonymous,
            complaint_id: None,
            feedback: None,
            created_at: now.into(),
            updated_at: None,
        };

        let txn = self.report_repo.begin().await?;
        let report = CrimeReportRepository::insert(&txn, report).await?;
        StatusEventRepository::append(
            &txn,
            report_status_event::Model {
                id: self.id_gen.generate(),
                report_id: report.id.clone(),
                from_status: None,
                to_status: ReportStatus::Pending,
                actor_id: (!input.is_anonymous).then(|| reporter.id.clone()),
                feedback: None,
                created_at: now.into(),
            },
        )
        .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        info!(
            report = %report.id,
            category = %report.category,
            pincode = %report.pincode,
            anonymous = report.is_anonymous,
            "Crime report filed"
        );

        // The report is stored either way; routing can be retried by an admin.
        let routed = match self.complaint_service.route(&report).await {
            Ok(routed) => routed,
            Err(e) => {
                warn!(report = %report.id, error = %e, "Routing failed for new report");
                None
            }
        };

        Ok(match routed {
            Some(AssignmentOutcome {
                assignment,
                complaint_id,
            }) => CreatedReport {
                report: crime_report::Model {
                    complaint_id: Some(complaint_id),
                    ..report
                },
                assigned_authority_id: Some(assignment.authority_id),
            },
            None => CreatedReport {
                report,
                assigned_authority_id: None,
            },
        })
    }

    /// Get a report by ID.
    pub async fn get(&self, id: &str) -> AppResult<crime_report::Model> {
        self.report_repo.get_by_id(id).await
    }

    /// Get a report the actor is allowed to read.
    pub async fn get_visible(
        &self,
        actor: &account::Model,
        id: &str,
    ) -> AppResult<crime_report::Model> {
        let report = self.get(id).await?;
        if !Self::visible_to(actor, &report) {
            return Err(AppError::Forbidden(
                "You do not have access to this report".to_string(),
            ));
        }
        Ok(report)
    }

    /// The reporter, any authority and admins may read a report.
    #[must_use]
    pub fn visible_to(actor: &account::Model, report: &crime_report::Model) -> bool {
        match actor.role {
            AccountRole::Admin | AccountRole::Authority => true,
            AccountRole::Citizen => report.reporter_id.as_deref() == Some(actor.id.as_str()),
        }
    }

    /// Reports within `radius_km` of a point, nearest first.
    pub async fn find_nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_km: Option<f64>,
    ) -> AppResult<Vec<NearbyReport>> {
        check_coordinates(lat, lng).map_err(AppError::Validation)?;

        let radius = radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(AppError::Validation(
                "radius: must be a positive number of kilometres".to_string(),
            ));
        }
        let radius = radius.min(MAX_RADIUS_KM);

        let d_lat = radius / KM_PER_DEGREE;
        let cos_lat = lat.to_radians().cos();
        // Near the poles the box spans every longitude.
        let d_lng = if cos_lat < 1e-6 {
            180.0
        } else {
            (radius / (KM_PER_DEGREE * cos_lat)).min(180.0)
        };

        let candidates = self
            .report_repo
            .find_in_bounds(
                ((lat - d_lat).max(-90.0), (lat + d_lat).min(90.0)),
                &longitude_ranges(lng, d_lng),
            )
            .await?;

        let mut nearby: Vec<NearbyReport> = candidates
            .into_iter()
            .filter_map(|report| {
                let distance_km = haversine_km((lat, lng), (report.latitude, report.longitude));
                (distance_km <= radius).then_some(NearbyReport {
                    report,
                    distance_km,
                })
            })
            .collect();
        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        Ok(nearby)
    }

    /// Reports for a pincode, newest first, one page at a time.
    pub async fn find_by_pincode(
        &self,
        pincode: &str,
        page: Option<u64>,
        per_page: Option<u64>,
    ) -> AppResult<PincodePage> {
        if !is_valid_pincode(pincode) {
            return Err(AppError::Validation(
                "pincode: must be exactly 6 digits".to_string(),
            ));
        }

        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

        let (crimes, total) = self
            .report_repo
            .find_by_pincode_page(pincode, page, per_page)
            .await?;

        Ok(PincodePage {
            crimes,
            total,
            pages: total.div_ceil(per_page),
            current_page: page,
        })
    }

    /// A citizen's own reports, newest first.
    pub async fn history_for(&self, citizen_id: &str) -> AppResult<Vec<crime_report::Model>> {
        self.report_repo.find_by_reporter(citizen_id).await
    }

    /// Pincodes that have at least one report.
    pub async fn pincodes(&self) -> AppResult<Vec<String>> {
        self.report_repo.distinct_pincodes().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::fixtures::{account, authority, report, rows};
    use crimewatch_common::RoutingConfig;
    use crimewatch_db::{
        entities::complaint_assignment,
        repositories::{AccountRepository, ComplaintRepository},
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn service(db: DatabaseConnection) -> ReportService {
        let db = Arc::new(db);
        let complaints = ComplaintService::new(
            CrimeReportRepository::new(db.clone()),
            ComplaintRepository::new(db.clone()),
            AccountRepository::new(db.clone()),
            StatusEventRepository::new(db.clone()),
            RoutingConfig::default(),
        );
        ReportService::new(CrimeReportRepository::new(db), complaints)
    }

    fn theft_input() -> CreateReportInput {
        CreateReportInput {
            title: Some("Phone snatched".to_string()),
            description: Some("Snatched near the metro gate".to_string()),
            category: Some("Theft".to_string()),
            severity: Some(3),
            latitude: Some(28.6),
            longitude: Some(77.2),
            pincode: Some("110001".to_string()),
            is_anonymous: false,
        }
    }

    #[test]
    fn test_missing_fields_reported_together() {
        let input = CreateReportInput {
            title: Some("Something happened".to_string()),
            description: Some("   ".to_string()),
            ..CreateReportInput::default()
        };

        match input.validate() {
            Err(AppError::MissingFields(fields)) => assert_eq!(
                fields,
                vec!["category", "description", "pincode", "latitude", "longitude"]
            ),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_format_errors_reported_together() {
        let input = CreateReportInput {
            category: Some("Jaywalking".to_string()),
            pincode: Some("1100".to_string()),
            latitude: Some(91.0),
            ..theft_input()
        };

        match input.validate() {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("category"));
                assert!(msg.contains("pincode"));
                assert!(msg.contains("latitude"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults_and_normalization() {
        let input = CreateReportInput {
            title: None,
            category: Some("traffic violation".to_string()),
            severity: Some(9),
            ..theft_input()
        };

        let valid = input.validate().unwrap();
        assert_eq!(valid.title, DEFAULT_TITLE);
        assert_eq!(valid.category, "Traffic Violation");
        assert_eq!(valid.severity, 5);
    }

    #[test]
    fn test_normalize_severity() {
        assert_eq!(normalize_severity(None), 3);
        assert_eq!(normalize_severity(Some(0)), 1);
        assert_eq!(normalize_severity(Some(-7)), 1);
        assert_eq!(normalize_severity(Some(4)), 4);
        assert_eq!(normalize_severity(Some(i64::MAX)), 5);
    }

    #[test]
    fn test_pincode_format() {
        assert!(is_valid_pincode("110001"));
        assert!(!is_valid_pincode("11000"));
        assert!(!is_valid_pincode("1100011"));
        assert!(!is_valid_pincode("11a001"));
    }

    #[test]
    fn test_haversine_known_distance() {
        // New Delhi to Mumbai is roughly 1150 km.
        let d = haversine_km((28.6139, 77.2090), (19.0760, 72.8777));
        assert!((1140.0..1160.0).contains(&d), "got {d}");
        assert!(haversine_km((28.6, 77.2), (28.6, 77.2)).abs() < 1e-9);
    }

    #[test]
    fn test_visibility() {
        let own = report("r1", ReportStatus::Pending);
        let anonymous = crime_report::Model {
            reporter_id: None,
            is_anonymous: true,
            ..report("r2", ReportStatus::Pending)
        };

        assert!(ReportService::visible_to(&account("citizen1", AccountRole::Citizen), &own));
        assert!(!ReportService::visible_to(&account("citizen2", AccountRole::Citizen), &own));
        assert!(!ReportService::visible_to(&account("citizen1", AccountRole::Citizen), &anonymous));
        assert!(ReportService::visible_to(&authority("auth1"), &anonymous));
        assert!(ReportService::visible_to(&account("admin1", AccountRole::Admin), &own));
    }

    #[tokio::test]
    async fn test_create_theft_report_is_pending() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([rows(1), rows(1)])
            .append_query_results([Vec::<complaint_assignment::Model>::new()])
            .append_query_results([Vec::<account::Model>::new()])
            .into_connection();

        let created = service(db)
            .create(&account("citizen1", AccountRole::Citizen), theft_input())
            .await
            .unwrap();

        assert_eq!(created.report.status, ReportStatus::Pending);
        assert_eq!(created.report.severity, 3);
        assert_eq!(created.report.pincode, "110001");
        assert_eq!(created.report.reporter_id.as_deref(), Some("citizen1"));
        assert!(created.report.complaint_id.is_none());
        assert!(created.assigned_authority_id.is_none());
    }

    #[tokio::test]
    async fn test_create_routes_to_matching_authority() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // insert report, status event
            .append_exec_results([rows(1), rows(1)])
            .append_query_results([Vec::<complaint_assignment::Model>::new()])
            .append_query_results([[authority("auth1")]])
            // touch, assignment insert, complaint id
            .append_exec_results([rows(1), rows(1), rows(1)])
            .append_query_results([Vec::<complaint_assignment::Model>::new()])
            .into_connection();

        let created = service(db)
            .create(&account("citizen1", AccountRole::Citizen), theft_input())
            .await
            .unwrap();

        assert_eq!(created.assigned_authority_id.as_deref(), Some("auth1"));
        assert!(created.report.complaint_id.is_some());
        assert_eq!(created.report.status, ReportStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_anonymous_drops_reporter() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([rows(1), rows(1)])
            .append_query_results([Vec::<complaint_assignment::Model>::new()])
            .append_query_results([Vec::<account::Model>::new()])
            .into_connection();

        let created = service(db)
            .create(
                &account("citizen1", AccountRole::Citizen),
                CreateReportInput {
                    is_anonymous: true,
                    ..theft_input()
                },
            )
            .await
            .unwrap();

        assert!(created.report.reporter_id.is_none());
        assert!(created.report.is_anonymous);
    }

    #[tokio::test]
    async fn test_create_survives_routing_failure() {
        // No query results queued: routing fails on its first read.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([rows(1), rows(1)])
            .into_connection();

        let created = service(db)
            .create(&account("citizen1", AccountRole::Citizen), theft_input())
            .await
            .unwrap();

        assert_eq!(created.report.status, ReportStatus::Pending);
        assert!(created.assigned_authority_id.is_none());
    }

    #[tokio::test]
    async fn test_find_nearby_filters_and_sorts() {
        let near = crime_report::Model {
            latitude: 28.61,
            longitude: 77.21,
            ..report("near", ReportStatus::Pending)
        };
        let nearest = report("nearest", ReportStatus::Pending);
        let corner = crime_report::Model {
            latitude: 28.644,
            longitude: 77.245,
            ..report("corner", ReportStatus::Pending)
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[near, nearest, corner]])
            .into_connection();

        let result = service(db).find_nearby(28.6, 77.2, None).await.unwrap();
        let ids: Vec<&str> = result.iter().map(|r| r.report.id.as_str()).collect();

        assert_eq!(ids, vec!["nearest", "near"]);
        assert!(result[0].distance_km <= result[1].distance_km);
    }

    #[test]
    fn test_longitude_ranges_wrap_at_antimeridian() {
        assert_eq!(longitude_ranges(77.2, 0.5), vec![(76.7, 77.7)]);
        assert_eq!(longitude_ranges(10.0, 180.0), vec![(-180.0, 180.0)]);

        let east = longitude_ranges(179.5, 1.0);
        assert_eq!(east.len(), 2);
        assert!((east[0].0 - 178.5).abs() < 1e-9 && east[0].1 == 180.0);
        assert!(east[1].0 == -180.0 && (east[1].1 + 179.5).abs() < 1e-9);

        let west = longitude_ranges(-179.5, 1.0);
        assert_eq!(west.len(), 2);
        assert!((west[0].0 - 179.5).abs() < 1e-9 && west[0].1 == 180.0);
        assert!(west[1].0 == -180.0 && (west[1].1 + 178.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_find_nearby_across_antimeridian() {
        let across = crime_report::Model {
            latitude: 0.0,
            longitude: -179.99,
            ..report("across", ReportStatus::Pending)
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[across]])
            .into_connection();

        let result = service(db).find_nearby(0.0, 179.99, Some(10.0)).await.unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].distance_km < 2.5, "got {}", result[0].distance_km);
    }

    #[tokio::test]
    async fn test_find_nearby_rejects_bad_radius() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).find_nearby(28.6, 77.2, Some(-1.0)).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_find_by_pincode_pages() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(23))
            }]])
            .append_query_results([[report("r1", ReportStatus::Pending)]])
            .into_connection();

        let page = service(db)
            .find_by_pincode("110001", Some(3), Some(10))
            .await
            .unwrap();

        assert_eq!(page.total, 23);
        assert_eq!(page.pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.crimes.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_pincode_rejects_malformed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = service(db).find_by_pincode("11A001", None, None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
