//! HTTP handlers

mod auth;
mod health;
mod household;
mod line;

pub use auth::{csrf_token, delete_user, login, logout, me, signup, UserInfo};
pub use health::{health, ready};
pub use household::{household_users, join_household};
pub use line::{line_callback, line_create_account, line_link_account, line_login};
