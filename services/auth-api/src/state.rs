//! Application state

use std::ops::Deref;
use std::sync::Arc;

use hearth_auth_core::{
    AccountService, CsrfProtection, LineLoginService, SessionTokens, TokenStore,
};
use hearth_db::pg::{PgHouseholdRepository, PgUnitOfWork, PgUserRepository, Repositories};
use hearth_db::DbPool;

use crate::config::Config;

/// Account service with concrete repository types
pub type AccountServiceImpl =
    AccountService<PgUserRepository, PgHouseholdRepository, PgUnitOfWork>;

/// LINE login service with concrete repository types
pub type LineLoginImpl = LineLoginService<PgUserRepository, PgHouseholdRepository, PgUnitOfWork>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// LINE federated login orchestrator
    pub line_login: Arc<LineLoginImpl>,
    /// Password accounts and household membership
    pub accounts: Arc<AccountServiceImpl>,
    /// Session token issuer/verifier
    pub sessions: SessionTokens,
    /// CSRF token service backing the middleware
    pub csrf: Arc<CsrfProtection>,
    /// OAuth state nonce store, shared with the LINE login service
    pub state_store: Arc<TokenStore>,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire up services over the given repositories
    pub fn new(config: Config, repos: Repositories, pool: DbPool) -> Self {
        let sessions = SessionTokens::new(
            config.auth.app_secret.clone(),
            config.auth.session_lifetime,
        );
        let csrf = Arc::new(CsrfProtection::new(config.auth.state_lifetime));
        let state_store = Arc::new(TokenStore::new());

        let users = Arc::new(repos.users);
        let households = Arc::new(repos.households);
        let uow = Arc::new(repos.uow);

        let accounts = Arc::new(AccountService::new(
            Arc::clone(&users),
            households,
            uow,
            sessions.clone(),
        ));
        let line_login = Arc::new(LineLoginService::new(
            config.auth.clone(),
            Arc::clone(&state_store),
            users,
            Arc::clone(&accounts),
        ));

        Self {
            line_login,
            accounts,
            sessions,
            csrf,
            state_store,
            pool: SharedPool(Arc::new(pool)),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}
