//! API endpoints.

mod admin;
mod auth;
mod authority;
mod chat;
mod crimes;
mod meta;
mod users;

use axum::Router;

pub use meta::health_router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/crimes", crimes::router())
        .nest("/authority", authority::router())
        .nest("/chat", chat::router())
        .nest("/admin", admin::router())
}
