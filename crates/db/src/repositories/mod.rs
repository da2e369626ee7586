//! Repositories wrapping the entities with the queries the services need.

mod account;
mod chat;
mod complaint;
mod crime_report;
mod report_status_event;

pub use account::AccountRepository;
pub use chat::ChatRepository;
pub use complaint::ComplaintRepository;
pub use crime_report::CrimeReportRepository;
pub use report_status_event::StatusEventRepository;
