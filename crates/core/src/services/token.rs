//! Bearer token issuing and verification (HS256 JWT).

use chrono::{Duration, Utc};
use crimewatch_common::{AppError, AppResult, config::AuthConfig};
use crimewatch_db::entities::account::{self, AccountRole};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: String,
    /// Role at issue time; re-checked against the store on every request
    pub role: AccountRole,
    pub exp: i64,
    pub iat: i64,
}

/// A freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Token service.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::minutes(config.token_ttl_minutes),
        }
    }

    /// Issue a token for an account.
    pub fn issue(&self, account: &account::Model) -> AppResult<IssuedToken> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.clone(),
            role: account.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Verify signature and expiry. Any failure is `Unauthorized`.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(ttl: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: ttl,
        }
    }

    fn account() -> account::Model {
        account::Model {
            id: "acc1".to_string(),
            username: "asha".to_string(),
            username_lower: "asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            role: AccountRole::Authority,
            badge_number: None,
            department: None,
            jurisdiction: None,
            phone_number: None,
            is_approved: true,
            approved_at: None,
            is_blocked: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let svc = TokenService::new(&config(30));
        let token = svc.issue(&account()).unwrap();

        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 1800);

        let claims = svc.verify(&token.access_token).unwrap();
        assert_eq!(claims.sub, "acc1");
        assert_eq!(claims.role, AccountRole::Authority);
    }

    #[test]
    fn test_expired_token_is_unauthorized() {
        let svc = TokenService::new(&config(-5));
        let token = svc.issue(&account()).unwrap();

        assert!(matches!(
            svc.verify(&token.access_token),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_foreign_secret_is_unauthorized() {
        let token = TokenService::new(&config(30)).issue(&account()).unwrap();
        let other = TokenService::new(&AuthConfig {
            jwt_secret: "another-secret".to_string(),
            token_ttl_minutes: 30,
        });

        assert!(matches!(
            other.verify(&token.access_token),
            Err(AppError::Unauthorized)
        ));
    }
}
