//! CSV exports for the admin console.

use crimewatch_common::{AppError, AppResult};
use crimewatch_db::{
    entities::{account, crime_report},
    repositories::{AccountRepository, CrimeReportRepository},
};
use serde::Deserialize;
use tracing::info;

/// What to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    #[default]
    Users,
    Crimes,
}

impl ExportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Crimes => "crimes",
        }
    }

    /// Download name offered to the browser.
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}_export.csv", self.as_str())
    }
}

impl std::str::FromStr for ExportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "users" => Ok(Self::Users),
            "crimes" => Ok(Self::Crimes),
            other => Err(AppError::Validation(format!(
                "type: '{other}' is not one of users, crimes"
            ))),
        }
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn push_row(csv: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
    csv.push_str(&row.join(","));
    csv.push('\n');
}

/// Accounts as CSV: `id,username,email,role,is_approved,is_blocked,created_at`.
///
/// Password hashes never leave the store.
#[must_use]
pub fn users_csv(accounts: &[account::Model]) -> String {
    let mut csv = String::from("id,username,email,role,is_approved,is_blocked,created_at\n");
    for a in accounts {
        push_row(
            &mut csv,
            &[
                &a.id,
                &a.username,
                &a.email,
                a.role.as_str(),
                if a.is_approved { "true" } else { "false" },
                if a.is_blocked { "true" } else { "false" },
                &a.created_at.to_rfc3339(),
            ],
        );
    }
    csv
}

/// Reports as CSV: `id,complaint_id,category,severity,pincode,status,created_at`.
#[must_use]
pub fn crimes_csv(reports: &[crime_report::Model]) -> String {
    let mut csv = String::from("id,complaint_id,category,severity,pincode,status,created_at\n");
    for r in reports {
        push_row(
            &mut csv,
            &[
                &r.id,
                r.complaint_id.as_deref().unwrap_or(""),
                &r.category,
                &r.severity.to_string(),
                &r.pincode,
                r.status.as_str(),
                &r.created_at.to_rfc3339(),
            ],
        );
    }
    csv
}

/// Export service.
#[derive(Clone)]
pub struct ExportService {
    account_repo: AccountRepository,
    report_repo: CrimeReportRepository,
}

impl ExportService {
    #[must_use]
    pub const fn new(account_repo: AccountRepository, report_repo: CrimeReportRepository) -> Self {
        Self {
            account_repo,
            report_repo,
        }
    }

    /// Render one table as CSV.
    pub async fn export_csv(&self, kind: ExportKind) -> AppResult<String> {
        let (csv, rows) = match kind {
            ExportKind::Users => {
                let accounts = self.account_repo.all().await?;
                (users_csv(&accounts), accounts.len())
            }
            ExportKind::Crimes => {
                let reports = self.report_repo.all().await?;
                (crimes_csv(&reports), reports.len())
            }
        };

        info!(kind = kind.as_str(), rows, "Exported CSV");
        Ok(csv)
    }
}
