//! Database entities.

#![allow(missing_docs)]

pub mod account;
pub mod chat_message;
pub mod chat_room;
pub mod complaint_assignment;
pub mod crime_report;
pub mod report_status_event;

pub use account::Entity as Account;
pub use chat_message::Entity as ChatMessage;
pub use chat_room::Entity as ChatRoom;
pub use complaint_assignment::Entity as ComplaintAssignment;
pub use crime_report::Entity as CrimeReport;
pub use report_status_event::Entity as ReportStatusEvent;
