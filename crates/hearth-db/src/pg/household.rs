//! PostgreSQL household repository implementation

use async_trait::async_trait;
use hearth_types::HouseholdId;
use sqlx::PgPool;

use crate::error::DbResult;
use crate::models::HouseholdRow;
use crate::repo::HouseholdRepository;

/// PostgreSQL household repository
#[derive(Clone)]
pub struct PgHouseholdRepository {
    pool: PgPool,
}

impl PgHouseholdRepository {
    /// Create a new household repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HouseholdRepository for PgHouseholdRepository {
    async fn find_by_id(&self, id: HouseholdId) -> DbResult<Option<HouseholdRow>> {
        let household = sqlx::query_as::<_, HouseholdRow>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM households
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(household)
    }

    async fn find_by_invite_code(&self, invite_code: &str) -> DbResult<Option<HouseholdRow>> {
        let household = sqlx::query_as::<_, HouseholdRow>(
            r#"
            SELECT id, name, invite_code, created_at
            FROM households
            WHERE invite_code = $1
            "#,
        )
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(household)
    }
}
