//! Repository traits
//!
//! Define async repository interfaces for database operations, plus the
//! unit-of-work boundary used for multi-row atomic writes.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use hearth_types::{HouseholdId, LineUserId, UserId};

use crate::error::DbResult;
use crate::models::*;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Find a user by LINE user ID
    async fn find_by_line_user_id(&self, line_user_id: &LineUserId) -> DbResult<Option<UserRow>>;

    /// Find all users belonging to a household
    async fn find_by_household_id(&self, household_id: HouseholdId) -> DbResult<Vec<UserRow>>;

    /// Attach a LINE user ID to an existing account
    async fn set_line_user_id(&self, id: UserId, line_user_id: &LineUserId) -> DbResult<()>;

    /// Move a user into a household
    async fn set_household(&self, id: UserId, household_id: HouseholdId) -> DbResult<()>;

    /// Delete a user
    async fn delete(&self, id: UserId) -> DbResult<()>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub avatar_url: String,
    pub admin: bool,
    pub household_id: HouseholdId,
    pub line_user_id: Option<String>,
}

/// Household repository trait
#[async_trait]
pub trait HouseholdRepository: Send + Sync {
    /// Find a household by ID
    async fn find_by_id(&self, id: HouseholdId) -> DbResult<Option<HouseholdRow>>;

    /// Find a household by invite code
    async fn find_by_invite_code(&self, invite_code: &str) -> DbResult<Option<HouseholdRow>>;
}

/// Create household input
#[derive(Debug, Clone)]
pub struct CreateHousehold {
    pub name: String,
    pub invite_code: String,
}

/// Boxed future returned by unit-of-work closures.
pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = DbResult<T>> + Send + 'a>>;

/// Repository bundle bound to a single open transaction.
///
/// Every write issued through the bundle shares the same transaction; the
/// bundle is handed to a [`UnitOfWork`] closure and must not outlive it.
#[async_trait]
pub trait TxRepositories: Send {
    /// Insert a household inside the transaction
    async fn create_household(&mut self, household: CreateHousehold) -> DbResult<HouseholdRow>;

    /// Insert a user inside the transaction
    async fn create_user(&mut self, user: CreateUser) -> DbResult<UserRow>;
}

/// Unit of work: run a closure against a fresh transactional repository
/// bundle, committing on success and rolling back on error.
pub trait UnitOfWork: Send + Sync {
    type Repos: TxRepositories;

    /// Execute `f` inside a single transaction.
    ///
    /// The transaction commits only when `f` returns `Ok`; on `Err` it is
    /// rolled back and the error is propagated unchanged. All writes inside
    /// `f` must go through the provided bundle.
    fn run_in_transaction<'s, T, F>(&'s self, f: F) -> TxFuture<'s, T>
    where
        T: Send + 's,
        F: for<'a> FnOnce(&'a mut Self::Repos) -> TxFuture<'a, T> + Send + 's;
}
