//! ID generation utilities.

use chrono::{Datelike, Utc};
use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a human-facing complaint identifier, e.g. `CR-2025-3F9A1C`.
    #[must_use]
    pub fn generate_complaint_id(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
        format!("CR-{}-{suffix}", Utc::now().year())
    }
}
