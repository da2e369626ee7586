//! Account repository.

use std::sync::Arc;

use crate::entities::{
    Account,
    account::{self, AccountRole},
};
use chrono::Utc;
use crimewatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Account repository for database operations.
#[derive(Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Create a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an account by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<account::Model>> {
        Account::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<account::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {id} not found")))
    }

    /// Find accounts by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<account::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Account::find()
            .filter(account::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by either username or email, as typed into a login form.
    pub async fn find_by_login(&self, identifier: &str) -> AppResult<Option<account::Model>> {
        let needle = identifier.trim().to_lowercase();

        Account::find()
            .filter(
                Condition::any()
                    .add(account::Column::UsernameLower.eq(needle.clone()))
                    .add(account::Column::Email.eq(needle)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an authority by badge number.
    pub async fn find_by_badge_number(&self, badge: &str) -> AppResult<Option<account::Model>> {
        Account::find()
            .filter(account::Column::BadgeNumber.eq(badge))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new account.
    pub async fn create(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an account.
    pub async fn update(&self, model: account::ActiveModel) -> AppResult<account::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set or clear the blocked flag (single UPDATE query, no fetch).
    ///
    /// Returns the number of rows touched; zero means the account does not exist.
    pub async fn set_blocked(&self, id: &str, blocked: bool) -> AppResult<u64> {
        let result = Account::update_many()
            .col_expr(account::Column::IsBlocked, Expr::value(blocked))
            .col_expr(account::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(account::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Approve a pending authority.
    ///
    /// Only unapproved authority rows match, so approving twice touches nothing.
    pub async fn approve_authority(&self, id: &str) -> AppResult<u64> {
        let now = Utc::now();
        let result = Account::update_many()
            .col_expr(account::Column::IsApproved, Expr::value(true))
            .col_expr(account::Column::ApprovedAt, Expr::value(now))
            .col_expr(account::Column::UpdatedAt, Expr::value(now))
            .filter(account::Column::Id.eq(id))
            .filter(account::Column::Role.eq(AccountRole::Authority))
            .filter(account::Column::IsApproved.eq(false))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List accounts, optionally filtered by role (newest first).
    pub async fn list(
        &self,
        role: Option<AccountRole>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<account::Model>> {
        let mut query = Account::find().order_by_desc(account::Column::CreatedAt);

        if let Some(r) = role {
            query = query.filter(account::Column::Role.eq(r));
        }

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every account, oldest first.
    pub async fn all(&self) -> AppResult<Vec<account::Model>> {
        Account::find()
            .order_by_asc(account::Column::CreatedAt)
            .order_by_asc(account::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accounts, optionally filtered by role.
    pub async fn count(&self, role: Option<AccountRole>) -> AppResult<u64> {
        let mut query = Account::find();

        if let Some(r) = role {
            query = query.filter(account::Column::Role.eq(r));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List authority accounts filtered by approval state.
    pub async fn list_authorities(&self, approved: Option<bool>) -> AppResult<Vec<account::Model>> {
        let mut query = Account::find()
            .filter(account::Column::Role.eq(AccountRole::Authority))
            .order_by_desc(account::Column::CreatedAt);

        if let Some(a) = approved {
            query = query.filter(account::Column::IsApproved.eq(a));
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count authorities waiting for approval.
    pub async fn count_pending_authorities(&self) -> AppResult<u64> {
        Account::find()
            .filter(account::Column::Role.eq(AccountRole::Authority))
            .filter(account::Column::IsApproved.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Authorities that may receive complaints, oldest account first.
    pub async fn find_active_authorities(&self) -> AppResult<Vec<account::Model>> {
        Account::find()
            .filter(account::Column::Role.eq(AccountRole::Authority))
            .filter(account::Column::IsApproved.eq(true))
            .filter(account::Column::IsBlocked.eq(false))
            .order_by_asc(account::Column::CreatedAt)
            .order_by_asc(account::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
