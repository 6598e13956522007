//! PostgreSQL unit-of-work implementation
//!
//! Wraps a SQLx transaction behind the [`UnitOfWork`] trait so that multi-row
//! writes (household + founding user) either both commit or both roll back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::DbResult;
use crate::models::{HouseholdRow, UserRow};
use crate::repo::{CreateHousehold, CreateUser, TxFuture, TxRepositories, UnitOfWork};

/// Repository bundle bound to one open Postgres transaction
pub struct PgTxRepositories {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TxRepositories for PgTxRepositories {
    async fn create_household(&mut self, household: CreateHousehold) -> DbResult<HouseholdRow> {
        let row = sqlx::query_as::<_, HouseholdRow>(
            r#"
            INSERT INTO households (name, invite_code)
            VALUES ($1, $2)
            RETURNING id, name, invite_code, created_at
            "#,
        )
        .bind(&household.name)
        .bind(&household.invite_code)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn create_user(&mut self, user: CreateUser) -> DbResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, name, avatar_url, admin,
                               household_id, line_user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, password_hash, name, avatar_url, admin,
                      household_id, line_user_id, created_at, updated_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.avatar_url)
        .bind(user.admin)
        .bind(user.household_id.0)
        .bind(&user.line_user_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }
}

/// PostgreSQL unit of work
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    /// Create a new unit of work over the given pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UnitOfWork for PgUnitOfWork {
    type Repos = PgTxRepositories;

    fn run_in_transaction<'s, T, F>(&'s self, f: F) -> TxFuture<'s, T>
    where
        T: Send + 's,
        F: for<'a> FnOnce(&'a mut Self::Repos) -> TxFuture<'a, T> + Send + 's,
    {
        Box::pin(async move {
            let tx = self.pool.begin().await?;
            let mut repos = PgTxRepositories { tx };

            match f(&mut repos).await {
                Ok(value) => {
                    repos.tx.commit().await?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = repos.tx.rollback().await {
                        tracing::error!("transaction rollback failed: {}", rollback_err);
                    }
                    Err(err)
                }
            }
        })
    }
}
