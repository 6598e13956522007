//! Hearth Types - Shared domain types
//!
//! This crate contains domain types used across Hearth services:
//! - User and household identifiers
//! - LINE identity value objects

pub mod household;
pub mod line;
pub mod user;

pub use household::*;
pub use line::*;
pub use user::*;
