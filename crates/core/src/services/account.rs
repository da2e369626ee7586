//! Account service: registration, login, and admin account management.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use crimewatch_common::{AppError, AppResult, IdGenerator, config::AdminConfig};
use crimewatch_db::{
    entities::account::{self, AccountRole},
    repositories::AccountRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::{Validate, ValidationError};

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    account_repo: AccountRepository,
    id_gen: IdGenerator,
}

/// Input for registering a citizen.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterCitizenInput {
    #[validate(length(min = 3, max = 80), custom(function = "validate_username"))]
    pub username: String,

    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 128))]
    pub full_name: Option<String>,
}

/// Input for registering an authority. The account starts unapproved.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAuthorityInput {
    #[validate(length(min = 3, max = 80), custom(function = "validate_username"))]
    pub username: String,

    #[validate(email, length(max = 255))]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 128))]
    pub full_name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub badge_number: String,

    #[validate(length(min = 1, max = 128))]
    pub department: String,

    #[validate(custom(function = "validate_jurisdiction"))]
    pub jurisdiction: String,

    #[validate(length(max = 20))]
    pub phone_number: Option<String>,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(account_repo: AccountRepository) -> Self {
        Self {
            account_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a citizen account.
    pub async fn register_citizen(&self, input: RegisterCitizenInput) -> AppResult<account::Model> {
        input.validate()?;
        self.ensure_unique(&input.username, &input.email).await?;

        let model = account::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email.to_lowercase()),
            password_hash: Set(hash_password(&input.password)?),
            full_name: Set(input.full_name),
            role: Set(AccountRole::Citizen),
            is_approved: Set(true),
            is_blocked: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let account = self.account_repo.create(model).await?;
        info!(account = %account.id, "Registered citizen");
        Ok(account)
    }

    /// Register an authority account awaiting admin approval.
    pub async fn register_authority(
        &self,
        input: RegisterAuthorityInput,
    ) -> AppResult<account::Model> {
        input.validate()?;
        self.ensure_unique(&input.username, &input.email).await?;

        let badge = input.badge_number.trim().to_string();
        if self.account_repo.find_by_badge_number(&badge).await?.is_some() {
            return Err(AppError::Conflict(
                "Badge number already registered".to_string(),
            ));
        }

        let model = account::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email.to_lowercase()),
            password_hash: Set(hash_password(&input.password)?),
            full_name: Set(input.full_name),
            role: Set(AccountRole::Authority),
            badge_number: Set(Some(badge)),
            department: Set(Some(input.department.trim().to_string())),
            jurisdiction: Set(Some(input.jurisdiction)),
            phone_number: Set(input.phone_number),
            is_approved: Set(false),
            is_blocked: Set(false),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let account = self.account_repo.create(model).await?;
        info!(account = %account.id, "Registered authority pending approval");
        Ok(account)
    }

    /// Check a username/email + password pair.
    ///
    /// Blocked accounts authenticate but are refused with `Forbidden`.
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<account::Model> {
        let account = self
            .account_repo
            .find_by_login(login)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if account.is_blocked {
            return Err(AppError::Forbidden("Account is blocked".to_string()));
        }

        Ok(account)
    }

    /// Get an account by ID.
    pub async fn get(&self, id: &str) -> AppResult<account::Model> {
        self.account_repo.get_by_id(id).await
    }

    /// Create the configured bootstrap admin unless the username exists.
    pub async fn ensure_admin(&self, admin: &AdminConfig) -> AppResult<Option<account::Model>> {
        if self
            .account_repo
            .find_by_username(&admin.username)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let now = Utc::now();
        let model = account::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(admin.username.clone()),
            username_lower: Set(admin.username.to_lowercase()),
            email: Set(admin.email.to_lowercase()),
            password_hash: Set(hash_password(&admin.password)?),
            role: Set(AccountRole::Admin),
            is_approved: Set(true),
            approved_at: Set(Some(now.into())),
            is_blocked: Set(false),
            created_at: Set(now.into()),
            ..Default::default()
        };

        let account = self.account_repo.create(model).await?;
        info!(account = %account.id, username = %account.username, "Created bootstrap admin");
        Ok(Some(account))
    }

    /// Block or unblock an account. Admin accounts cannot be blocked.
    pub async fn set_blocked(&self, id: &str, blocked: bool) -> AppResult<account::Model> {
        let account = self.account_repo.get_by_id(id).await?;
        if account.role == AccountRole::Admin {
            return Err(AppError::BadRequest(
                "Admin accounts cannot be blocked".to_string(),
            ));
        }

        self.account_repo.set_blocked(id, blocked).await?;
        info!(account = %id, blocked, "Changed account block state");

        Ok(account::Model {
            is_blocked: blocked,
            ..account
        })
    }

    /// Approve a pending authority.
    pub async fn approve_authority(&self, id: &str) -> AppResult<account::Model> {
        let account = self.account_repo.get_by_id(id).await?;
        if account.role != AccountRole::Authority {
            return Err(AppError::BadRequest(format!(
                "Account {id} is not an authority"
            )));
        }
        if account.is_approved {
            return Err(AppError::Conflict(format!(
                "Authority {id} is already approved"
            )));
        }

        if self.account_repo.approve_authority(id).await? == 0 {
            return Err(AppError::Conflict(format!(
                "Authority {id} is already approved"
            )));
        }
        info!(account = %id, "Approved authority");

        let now = Utc::now();
        Ok(account::Model {
            is_approved: true,
            approved_at: Some(now.into()),
            ..account
        })
    }

    /// List accounts (admin view).
    pub async fn list(
        &self,
        role: Option<AccountRole>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account::Model>> {
        self.account_repo.list(role, limit, offset).await
    }

    /// List authorities, optionally only pending or only approved ones.
    pub async fn list_authorities(&self, approved: Option<bool>) -> AppResult<Vec<account::Model>> {
        self.account_repo.list_authorities(approved).await
    }

    async fn ensure_unique(&self, username: &str, email: &str) -> AppResult<()> {
        if self.account_repo.find_by_username(username).await?.is_some()
            || self.account_repo.find_by_email(email).await?.is_some()
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars"))
    }
}

/// A pincode, a pincode prefix, or `*` for every area.
fn validate_jurisdiction(tag: &str) -> Result<(), ValidationError> {
    let is_prefix = (1..=6).contains(&tag.len()) && tag.bytes().all(|b| b.is_ascii_digit());
    if tag == "*" || is_prefix {
        Ok(())
    } else {
        let mut err = ValidationError::new("jurisdiction");
        err.message = Some("must be a pincode, a pincode prefix, or *".into());
        Err(err)
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_account(id: &str, role: AccountRole, password: &str) -> account::Model {
        account::Model {
            id: id.to_string(),
            username: "asha".to_string(),
            username_lower: "asha".to_string(),
            email: "asha@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            full_name: None,
            role,
            badge_number: None,
            department: None,
            jurisdiction: None,
            phone_number: None,
            is_approved: role != AccountRole::Authority,
            approved_at: None,
            is_blocked: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> AccountService {
        AccountService::new(AccountRepository::new(Arc::new(db)))
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[test]
    fn test_register_authority_input_validation() {
        let mut input = RegisterAuthorityInput {
            username: "officer_1".to_string(),
            email: "officer@example.com".to_string(),
            password: "password123".to_string(),
            full_name: None,
            badge_number: "B-100".to_string(),
            department: "Police".to_string(),
            jurisdiction: "110".to_string(),
            phone_number: None,
        };
        assert!(input.validate().is_ok());

        input.jurisdiction = "11a".to_string();
        assert!(input.validate().is_err());

        input.jurisdiction = "*".to_string();
        input.username = "no spaces".to_string();
        assert!(input.validate().is_err());
    }

    #[tokio::test]
    async fn test_register_citizen_duplicate_username_conflicts() {
        let existing = create_test_account("acc1", AccountRole::Citizen, "password123");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let result = svc
            .register_citizen(RegisterCitizenInput {
                username: "Asha".to_string(),
                email: "other@example.com".to_string(),
                password: "password123".to_string(),
                full_name: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password_is_unauthorized() {
        let account = create_test_account("acc1", AccountRole::Citizen, "password123");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );

        let result = svc.authenticate("asha", "nope").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_blocked_is_forbidden() {
        let mut account = create_test_account("acc1", AccountRole::Citizen, "password123");
        account.is_blocked = true;
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[account]])
                .into_connection(),
        );

        let result = svc.authenticate("asha", "password123").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_approve_authority() {
        let pending = create_test_account("auth1", AccountRole::Authority, "password123");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[pending]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let approved = svc.approve_authority("auth1").await.unwrap();
        assert!(approved.is_approved);
        assert!(approved.approved_at.is_some());
    }

    #[tokio::test]
    async fn test_approve_non_authority_is_bad_request() {
        let citizen = create_test_account("acc1", AccountRole::Citizen, "password123");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[citizen]])
                .into_connection(),
        );

        let result = svc.approve_authority("acc1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_block_admin_is_refused() {
        let admin = create_test_account("adm1", AccountRole::Admin, "password123");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[admin]])
                .into_connection(),
        );

        let result = svc.set_blocked("adm1", true).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
