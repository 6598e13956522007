//! In-memory repositories and unit of work for testing
//!
//! The unit of work stages inserts and only publishes them to the shared
//! maps on commit, so rollback semantics are real: a failing closure leaves
//! no trace in the repositories.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use hearth_db::{
    CreateHousehold, CreateUser, DbError, DbResult, HouseholdRepository, HouseholdRow, TxFuture,
    TxRepositories, UnitOfWork, UserRepository, UserRow,
};
use hearth_types::{HouseholdId, LineUserId, UserId};

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<i64, UserRow>>,
    next_id: Arc<AtomicI64>,
    /// When set, transactional user inserts fail (for rollback tests)
    fail_user_insert: Arc<AtomicBool>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, bypassing the unit of work
    pub fn insert_user(&self, user: UserRow) {
        self.users.insert(user.id, user);
    }

    /// Build a user row with the next free ID
    pub fn make_user(&self, email: &str, password_hash: &str, household_id: i64) -> UserRow {
        UserRow {
            id: self.allocate_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            name: "Taro".to_string(),
            avatar_url: String::new(),
            admin: false,
            household_id,
            line_user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Make every transactional user insert fail until reset
    pub fn fail_user_inserts(&self, fail: bool) {
        self.fail_user_insert.store(fail, Ordering::SeqCst);
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id.0).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().email == email && !email.is_empty())
            .map(|r| r.value().clone()))
    }

    async fn find_by_line_user_id(&self, line_user_id: &LineUserId) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().line_user_id.as_deref() == Some(line_user_id.as_str()))
            .map(|r| r.value().clone()))
    }

    async fn find_by_household_id(&self, household_id: HouseholdId) -> DbResult<Vec<UserRow>> {
        let mut users: Vec<UserRow> = self
            .users
            .iter()
            .filter(|r| r.value().household_id == household_id.0)
            .map(|r| r.value().clone())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn set_line_user_id(&self, id: UserId, line_user_id: &LineUserId) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id.0) {
            user.line_user_id = Some(line_user_id.as_str().to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_household(&self, id: UserId, household_id: HouseholdId) -> DbResult<()> {
        if let Some(mut user) = self.users.get_mut(&id.0) {
            user.household_id = household_id.0;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> DbResult<()> {
        self.users.remove(&id.0);
        Ok(())
    }
}

/// In-memory household repository for testing
#[derive(Default, Clone)]
pub struct MockHouseholdRepository {
    households: Arc<DashMap<i64, HouseholdRow>>,
    next_id: Arc<AtomicI64>,
}

impl MockHouseholdRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a household directly, bypassing the unit of work
    pub fn insert_household(&self, household: HouseholdRow) {
        self.households.insert(household.id, household);
    }

    pub fn household_count(&self) -> usize {
        self.households.len()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl HouseholdRepository for MockHouseholdRepository {
    async fn find_by_id(&self, id: HouseholdId) -> DbResult<Option<HouseholdRow>> {
        Ok(self.households.get(&id.0).map(|r| r.value().clone()))
    }

    async fn find_by_invite_code(&self, invite_code: &str) -> DbResult<Option<HouseholdRow>> {
        Ok(self
            .households
            .iter()
            .find(|r| r.value().invite_code == invite_code)
            .map(|r| r.value().clone()))
    }
}

/// Transaction-bound bundle staging inserts until commit
pub struct MemTxRepositories {
    users: MockUserRepository,
    households: MockHouseholdRepository,
    staged_users: Vec<UserRow>,
    staged_households: Vec<HouseholdRow>,
}

impl MemTxRepositories {
    fn new(users: MockUserRepository, households: MockHouseholdRepository) -> Self {
        Self {
            users,
            households,
            staged_users: Vec::new(),
            staged_households: Vec::new(),
        }
    }

    fn commit(self) {
        for household in self.staged_households {
            self.households.households.insert(household.id, household);
        }
        for user in self.staged_users {
            self.users.users.insert(user.id, user);
        }
    }
}

#[async_trait]
impl TxRepositories for MemTxRepositories {
    async fn create_household(&mut self, household: CreateHousehold) -> DbResult<HouseholdRow> {
        let row = HouseholdRow {
            id: self.households.allocate_id(),
            name: household.name,
            invite_code: household.invite_code,
            created_at: Utc::now(),
        };
        self.staged_households.push(row.clone());
        Ok(row)
    }

    async fn create_user(&mut self, user: CreateUser) -> DbResult<UserRow> {
        if self.users.fail_user_insert.load(Ordering::SeqCst) {
            return Err(DbError::NotFound);
        }

        let row = UserRow {
            id: self.users.allocate_id(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            avatar_url: user.avatar_url,
            admin: user.admin,
            household_id: user.household_id.0,
            line_user_id: user.line_user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.staged_users.push(row.clone());
        Ok(row)
    }
}

/// In-memory unit of work with stage-then-commit semantics
#[derive(Clone)]
pub struct MemUnitOfWork {
    users: MockUserRepository,
    households: MockHouseholdRepository,
}

impl MemUnitOfWork {
    pub fn new(users: MockUserRepository, households: MockHouseholdRepository) -> Self {
        Self { users, households }
    }
}

impl UnitOfWork for MemUnitOfWork {
    type Repos = MemTxRepositories;

    fn run_in_transaction<'s, T, F>(&'s self, f: F) -> TxFuture<'s, T>
    where
        T: Send + 's,
        F: for<'a> FnOnce(&'a mut Self::Repos) -> TxFuture<'a, T> + Send + 's,
    {
        Box::pin(async move {
            let mut repos =
                MemTxRepositories::new(self.users.clone(), self.households.clone());

            match f(&mut repos).await {
                Ok(value) => {
                    repos.commit();
                    Ok(value)
                }
                // Staged rows are dropped, nothing was published
                Err(err) => Err(err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commit_publishes_staged_rows() {
        let users = MockUserRepository::new();
        let households = MockHouseholdRepository::new();
        let uow = MemUnitOfWork::new(users.clone(), households.clone());

        let user = uow
            .run_in_transaction(|repos| {
                Box::pin(async move {
                    let household = repos
                        .create_household(CreateHousehold {
                            name: "Test Household".to_string(),
                            invite_code: "code-1".to_string(),
                        })
                        .await?;
                    repos
                        .create_user(CreateUser {
                            email: "a@example.com".to_string(),
                            password_hash: "hash".to_string(),
                            name: "Taro".to_string(),
                            avatar_url: String::new(),
                            admin: false,
                            household_id: household.household_id(),
                            line_user_id: None,
                        })
                        .await
                })
            })
            .await
            .unwrap();

        assert_eq!(users.user_count(), 1);
        assert_eq!(households.household_count(), 1);
        assert!(users.find_by_id(user.user_id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_error_rolls_back_staged_rows() {
        let users = MockUserRepository::new();
        let households = MockHouseholdRepository::new();
        let uow = MemUnitOfWork::new(users.clone(), households.clone());
        users.fail_user_inserts(true);

        let result = uow
            .run_in_transaction(|repos| {
                Box::pin(async move {
                    let household = repos
                        .create_household(CreateHousehold {
                            name: "Doomed Household".to_string(),
                            invite_code: "code-2".to_string(),
                        })
                        .await?;
                    repos
                        .create_user(CreateUser {
                            email: "b@example.com".to_string(),
                            password_hash: "hash".to_string(),
                            name: "Taro".to_string(),
                            avatar_url: String::new(),
                            admin: false,
                            household_id: household.household_id(),
                            line_user_id: None,
                        })
                        .await
                })
            })
            .await;

        assert!(result.is_err());
        // The household staged before the failure must not be visible
        assert_eq!(households.household_count(), 0);
        assert_eq!(users.user_count(), 0);
    }
}
