//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod analytics;
pub mod chat;
pub mod complaint;
pub mod export;
pub mod report;
pub mod token;

#[cfg(test)]
mod fixtures;

pub use account::{AccountService, RegisterAuthorityInput, RegisterCitizenInput};
pub use analytics::{
    ActiveArea, AnalyticsService, AuthorityDashboard, Bucket, CrimeAnalytics, DashboardStats,
    TimeRange,
};
pub use chat::{ChatService, RoomSummary, SendMessageInput};
pub use complaint::{AssignmentOutcome, ComplaintService, ComplaintView, is_eligible};
pub use export::{ExportKind, ExportService};
pub use report::{CreateReportInput, CreatedReport, NearbyReport, PincodePage, ReportService};
pub use token::{Claims, IssuedToken, TokenService};
