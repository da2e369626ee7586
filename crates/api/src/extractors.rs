//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use crimewatch_common::AppError;
use crimewatch_db::entities::account::{self, AccountRole};

/// Authenticated account extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub account::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        parts
            .extensions
            .get::<account::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// An authenticated citizen.
#[derive(Debug, Clone)]
pub struct CitizenUser(pub account::Model);

impl<S> FromRequestParts<S> for CitizenUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(account) = AuthUser::from_request_parts(parts, state).await?;
        if account.role != AccountRole::Citizen {
            return Err(AppError::Forbidden("Citizen access required".to_string()));
        }
        Ok(Self(account))
    }
}

/// An authenticated, approved authority.
#[derive(Debug, Clone)]
pub struct AuthorityUser(pub account::Model);

impl<S> FromRequestParts<S> for AuthorityUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(account) = AuthUser::from_request_parts(parts, state).await?;
        if account.role != AccountRole::Authority {
            return Err(AppError::Forbidden("Authority access required".to_string()));
        }
        if !account.is_approved {
            return Err(AppError::Forbidden(
                "Authority account is awaiting approval".to_string(),
            ));
        }
        Ok(Self(account))
    }
}

/// An authenticated admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub account::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(account) = AuthUser::from_request_parts(parts, state).await?;
        if account.role != AccountRole::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(account))
    }
}
