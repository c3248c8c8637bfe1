//! TutorHub REST API
//!
//! This crate provides the Axum-based HTTP API for TutorHub: the login
//! endpoints, the account group and the administrative resource groups,
//! each route guarded by its declared access level.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
