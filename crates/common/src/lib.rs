//! Common utilities and shared types for crimewatch-rs.
//!
//! This crate provides foundational components used across all crimewatch-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and complaint numbers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use crimewatch_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {} on port {}", id, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{Config, RoutingConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
