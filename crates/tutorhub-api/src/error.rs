//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use tutorhub_auth::AuthError;
use tutorhub_db::DbError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    /// Map a failed login so that every rejection looks identical
    ///
    /// Unknown account, wrong password and missing admin role all become
    /// the same `invalid credentials` response.
    pub fn login(e: AuthError) -> Self {
        if e.is_rejected_login() {
            ApiError::Auth(AuthError::InvalidCredentials)
        } else {
            ApiError::Auth(e)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Auth(e) => return e.into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Database(DbError::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, "not_found", msg)
            }
            ApiError::Database(DbError::Duplicate(msg)) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal error".to_string(),
                )
            }
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Internal error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
