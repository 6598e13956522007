//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, Utc};
use hearth_types::{HouseholdId, UserId};
use sqlx::FromRow;

/// User row from the database
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub avatar_url: String,
    pub admin: bool,
    pub household_id: i64,
    pub line_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Typed user ID
    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }

    /// Typed household ID
    pub fn household_id(&self) -> HouseholdId {
        HouseholdId(self.household_id)
    }
}

/// Household row from the database
#[derive(Debug, Clone, FromRow)]
pub struct HouseholdRow {
    pub id: i64,
    pub name: String,
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

impl HouseholdRow {
    /// Typed household ID
    pub fn household_id(&self) -> HouseholdId {
        HouseholdId(self.id)
    }
}
