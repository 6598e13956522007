//! Shared test fixtures

pub mod jwks_mock;
pub mod mock_repos;

pub use jwks_mock::{JwksMockServer, TestKeyPair, TestLineClaims};
pub use mock_repos::{MemUnitOfWork, MockHouseholdRepository, MockUserRepository};
