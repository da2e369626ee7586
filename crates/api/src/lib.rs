//! HTTP API layer for crimewatch.
//!
//! - **Endpoints**: citizen, authority, chat and admin routes under `/api`
//! - **Extractors**: authenticated account and role guards
//! - **Middleware**: bearer token authentication and shared state
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{health_router, router};
pub use middleware::{AppState, auth_middleware};
