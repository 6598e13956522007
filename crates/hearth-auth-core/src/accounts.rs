//! Password accounts and household membership
//!
//! Sign-up, email/password authentication, LINE identity linking, and the
//! household membership operations. Account creation always produces the
//! household + founding user pair inside one unit-of-work transaction.

use std::sync::Arc;

use hearth_db::{
    CreateHousehold, CreateUser, HouseholdRepository, TxRepositories, UnitOfWork, UserRepository,
    UserRow,
};
use hearth_types::{DisplayName, LineUserId, UserId, MAX_NAME_LENGTH};

use crate::preauth::PreAuthIdentity;
use crate::random::random_url_safe;
use crate::{AuthError, SessionTokens};

const BCRYPT_COST: u32 = 10;
const INVITE_CODE_BYTES: usize = 16;
const PLACEHOLDER_PASSWORD_BYTES: usize = 24;

/// Fallback display name for LINE identities that carry none
const DEFAULT_LINE_NAME: &str = "LINE user";

/// Sign-up input
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    pub avatar_url: String,
}

/// Account management service
pub struct AccountService<U, H, W> {
    users: Arc<U>,
    households: Arc<H>,
    uow: Arc<W>,
    sessions: SessionTokens,
}

impl<U, H, W> AccountService<U, H, W>
where
    U: UserRepository,
    H: HouseholdRepository,
    W: UnitOfWork,
{
    /// Create a new account service
    pub fn new(users: Arc<U>, households: Arc<H>, uow: Arc<W>, sessions: SessionTokens) -> Self {
        Self {
            users,
            households,
            uow,
            sessions,
        }
    }

    /// Create an account: a new household plus its founding user, atomically.
    pub async fn sign_up(&self, account: NewAccount) -> Result<UserRow, AuthError> {
        if account.email.is_empty() {
            return Err(AuthError::BadRequest("email is required".to_string()));
        }
        let name = DisplayName::new(account.name)
            .map_err(|e| AuthError::BadRequest(e.to_string()))?
            .into_inner();
        let password_hash = hash_password(&account.password)?;

        let household = CreateHousehold {
            name: format!("{name}'s Household"),
            invite_code: random_url_safe(INVITE_CODE_BYTES),
        };
        let email = account.email;
        let avatar_url = account.avatar_url;

        let user = self
            .uow
            .run_in_transaction(move |repos| {
                Box::pin(async move {
                    let household = repos.create_household(household).await?;
                    repos
                        .create_user(CreateUser {
                            email,
                            password_hash,
                            name,
                            avatar_url,
                            admin: false,
                            household_id: household.household_id(),
                            line_user_id: None,
                        })
                        .await
                })
            })
            .await?;

        Ok(user)
    }

    /// Check email/password credentials.
    ///
    /// Unknown email and wrong password both map to `AuthenticationFailed`;
    /// the caller cannot distinguish which check rejected it.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRow, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Err(AuthError::AuthenticationFailed);
        };

        let matches = bcrypt::verify(password, &user.password_hash).map_err(|e| {
            tracing::debug!("Password verification errored: {}", e);
            AuthError::AuthenticationFailed
        })?;
        if !matches {
            return Err(AuthError::AuthenticationFailed);
        }

        Ok(user)
    }

    /// Authenticate and issue a session token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self.authenticate(email, password).await?;
        self.sessions.issue(user.user_id())
    }

    /// Look up the user behind a verified session
    pub async fn current_user(&self, user_id: UserId) -> Result<UserRow, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Attach a LINE identity to an existing password account
    pub async fn link_line_account(
        &self,
        email: &str,
        password: &str,
        line_user_id: &LineUserId,
    ) -> Result<UserRow, AuthError> {
        let mut user = self.authenticate(email, password).await?;
        self.users
            .set_line_user_id(user.user_id(), line_user_id)
            .await?;
        user.line_user_id = Some(line_user_id.as_str().to_string());
        Ok(user)
    }

    /// Create a household + user pair for a LINE identity with no local
    /// account. The user gets an empty email and a random placeholder
    /// password; the LINE user ID is attached at creation.
    pub async fn create_line_user(&self, identity: &PreAuthIdentity) -> Result<UserRow, AuthError> {
        let name = line_display_name(&identity.display_name);
        let password_hash = hash_password(&random_url_safe(PLACEHOLDER_PASSWORD_BYTES))?;

        let household = CreateHousehold {
            name: format!("{name}'s Household"),
            invite_code: random_url_safe(INVITE_CODE_BYTES),
        };
        let avatar_url = identity.avatar_url.clone();
        let line_user_id = identity.line_user_id.as_str().to_string();

        let user = self
            .uow
            .run_in_transaction(move |repos| {
                Box::pin(async move {
                    let household = repos.create_household(household).await?;
                    repos
                        .create_user(CreateUser {
                            email: String::new(),
                            password_hash,
                            name,
                            avatar_url,
                            admin: false,
                            household_id: household.household_id(),
                            line_user_id: Some(line_user_id),
                        })
                        .await
                })
            })
            .await?;

        Ok(user)
    }

    /// List the members of the user's household
    pub async fn household_users(&self, user_id: UserId) -> Result<Vec<UserRow>, AuthError> {
        let user = self.current_user(user_id).await?;
        Ok(self
            .users
            .find_by_household_id(user.household_id())
            .await?)
    }

    /// Move the user into the household matching `invite_code`
    pub async fn join_household(&self, user_id: UserId, invite_code: &str) -> Result<(), AuthError> {
        let Some(household) = self.households.find_by_invite_code(invite_code).await? else {
            return Err(AuthError::BadRequest("invalid invite code".to_string()));
        };

        let user = self.current_user(user_id).await?;
        self.users
            .set_household(user.user_id(), household.household_id())
            .await?;

        Ok(())
    }

    /// Delete the user's account
    pub async fn delete_account(&self, user_id: UserId) -> Result<(), AuthError> {
        self.users.delete(user_id).await?;
        Ok(())
    }
}

impl<U, H, W> std::fmt::Debug for AccountService<U, H, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| {
        tracing::error!("Password hashing failed: {}", e);
        AuthError::Internal("password hashing failed".to_string())
    })
}

/// LINE display names are unconstrained; clamp to the local name length and
/// fall back to a fixed name when the provider sent none.
fn line_display_name(name: &str) -> String {
    let clamped: String = name.chars().take(MAX_NAME_LENGTH).collect();
    if clamped.is_empty() {
        DEFAULT_LINE_NAME.to_string()
    } else {
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_display_name_clamping() {
        assert_eq!(line_display_name("Taro"), "Taro");
        assert_eq!(line_display_name(""), DEFAULT_LINE_NAME);
        assert_eq!(line_display_name("abcdefghijklmnop"), "abcdefghijkl");
    }
}
