//! TutorHub Authentication and Authorization
//!
//! This crate provides credential verification, JWT issuance and
//! validation, and the role-based access gate applied to every
//! administrative route.

pub mod authenticator;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod store;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use jwt::{Claims, IssuedToken, TokenCodec};
pub use middleware::{AccessGate, AccessLevel, AuthUser, access_gate, authorize, guard, protect};
pub use password::{hash_password, verify_password};
pub use store::CredentialStore;
