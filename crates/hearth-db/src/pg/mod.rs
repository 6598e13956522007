//! PostgreSQL repository implementations

mod household;
mod uow;
mod user;

pub use household::PgHouseholdRepository;
pub use uow::{PgTxRepositories, PgUnitOfWork};
pub use user::PgUserRepository;

use crate::pool::DbPool;

/// Bundle of all repositories over one shared pool
#[derive(Clone)]
pub struct Repositories {
    pub users: PgUserRepository,
    pub households: PgHouseholdRepository,
    pub uow: PgUnitOfWork,
}

impl Repositories {
    /// Create repositories sharing the given pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            households: PgHouseholdRepository::new(pool.clone()),
            uow: PgUnitOfWork::new(pool),
        }
    }
}
