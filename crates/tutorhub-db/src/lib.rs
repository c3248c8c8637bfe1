//! TutorHub Database Layer
//!
//! This crate provides the persistence layer for TutorHub: the account
//! table used as the credential store and a generic document store shared
//! by every administrative resource kind. SQLite is accessed via sqlx.

pub mod error;
pub mod filter;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use filter::ResourceFilter;
pub use models::*;
pub use repository::Database;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
