//! PostgreSQL user repository implementation

use async_trait::async_trait;
use hearth_types::{HouseholdId, LineUserId, UserId};
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::UserRow;
use crate::repo::UserRepository;

/// PostgreSQL user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, admin,
                   household_id, line_user_id, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, admin,
                   household_id, line_user_id, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_line_user_id(&self, line_user_id: &LineUserId) -> DbResult<Option<UserRow>> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, admin,
                   household_id, line_user_id, created_at, updated_at
            FROM users
            WHERE line_user_id = $1
            "#,
        )
        .bind(line_user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_household_id(&self, household_id: HouseholdId) -> DbResult<Vec<UserRow>> {
        let users = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, admin,
                   household_id, line_user_id, created_at, updated_at
            FROM users
            WHERE household_id = $1
            ORDER BY id
            "#,
        )
        .bind(household_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn set_line_user_id(&self, id: UserId, line_user_id: &LineUserId) -> DbResult<()> {
        sqlx::query("UPDATE users SET line_user_id = $1, updated_at = now() WHERE id = $2")
            .bind(line_user_id.as_str())
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn set_household(&self, id: UserId, household_id: HouseholdId) -> DbResult<()> {
        sqlx::query("UPDATE users SET household_id = $1, updated_at = now() WHERE id = $2")
            .bind(household_id.0)
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, id: UserId) -> DbResult<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
