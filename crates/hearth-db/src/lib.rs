//! Hearth DB - Database abstractions
//!
//! SQLx-based database layer for Hearth services.
//!
//! # Example
//!
//! ```rust,ignore
//! use hearth_db::{create_pool, pg::Repositories};
//!
//! let pool = create_pool("postgres://localhost/hearth").await?;
//! let repos = Repositories::new(pool);
//!
//! let user = repos.users.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, DbPool};
pub use repo::*;
