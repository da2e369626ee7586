//! Core business logic for crimewatch-rs.
//!
//! The complaint lifecycle lives here: report intake, routing to an
//! authority, assignment responses, status transitions, and the per-report
//! chat. [`lifecycle`] holds the pure transition rules; [`services`] applies
//! them against the database.

pub mod lifecycle;
pub mod services;

pub use services::*;
