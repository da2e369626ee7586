//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use crimewatch_common::{AppError, AppResult, Config};
use crimewatch_core::{
    AccountService, AnalyticsService, ChatService, ComplaintService, ExportService, ReportService,
    TokenService,
};
use crimewatch_db::repositories::{
    AccountRepository, ChatRepository, ComplaintRepository, CrimeReportRepository,
    StatusEventRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub token_service: TokenService,
    pub report_service: ReportService,
    pub complaint_service: ComplaintService,
    pub chat_service: ChatService,
    pub analytics_service: AnalyticsService,
    pub export_service: ExportService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let account_repo = AccountRepository::new(Arc::clone(&db));
        let report_repo = CrimeReportRepository::new(Arc::clone(&db));
        let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
        let event_repo = StatusEventRepository::new(Arc::clone(&db));
        let chat_repo = ChatRepository::new(db);

        let complaint_service = ComplaintService::new(
            report_repo.clone(),
            complaint_repo.clone(),
            account_repo.clone(),
            event_repo,
            config.routing.clone(),
        );

        Self {
            account_service: AccountService::new(account_repo.clone()),
            token_service: TokenService::new(&config.auth),
            report_service: ReportService::new(report_repo.clone(), complaint_service.clone()),
            chat_service: ChatService::new(chat_repo, report_repo.clone(), complaint_repo),
            export_service: ExportService::new(account_repo.clone(), report_repo.clone()),
            analytics_service: AnalyticsService::new(report_repo, account_repo),
            complaint_service,
        }
    }
}

/// Authentication middleware.
///
/// Requests without a bearer token pass through untouched and are rejected
/// later by the extractors of protected handlers. A presented token must be
/// valid, name an existing account, and carry that account's current role.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .map(str::to_string);

    if let Some(token) = token {
        let claims = state.token_service.verify(&token)?;

        let account = match state.account_service.get(&claims.sub).await {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => return Err(AppError::Unauthorized),
            Err(e) => return Err(e),
        };

        if account.role != claims.role {
            tracing::debug!(
                account = %account.id,
                claimed = %claims.role,
                stored = %account.role,
                "Token role no longer matches account"
            );
            return Err(AppError::Unauthorized);
        }
        if account.is_blocked {
            return Err(AppError::Forbidden("Account is blocked".to_string()));
        }

        req.extensions_mut().insert(account);
    }

    Ok(next.run(req).await)
}
