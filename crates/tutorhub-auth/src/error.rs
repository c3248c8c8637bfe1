//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Every way an authentication or authorization check can fail
///
/// The `Display` strings keep the internal distinction for logs; the HTTP
/// rendering collapses them into a few generic messages.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Signing secret must not be empty")]
    WeakSecret,

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token signing error: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Token lifetime overflows the clock")]
    LifetimeOverflow,
}

impl AuthError {
    /// Failures of a login attempt that must all look the same to the client
    pub fn is_rejected_login(&self) -> bool {
        matches!(
            self,
            AuthError::AccountNotFound | AuthError::InvalidCredentials | AuthError::InsufficientRole
        )
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::Malformed => "malformed",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::InsufficientRole => "insufficient_role",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::WeakSecret => "weak_secret",
            AuthError::PasswordHash(_) => "password_hash",
            AuthError::Signing(_) => "signing",
            AuthError::Store(_) => "store",
            AuthError::LifetimeOverflow => "lifetime_overflow",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AuthError::MissingToken | AuthError::Malformed | AuthError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "unauthorized" }))
            }
            AuthError::Expired => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized", "code": "token_expired" }),
            ),
            AuthError::InsufficientRole => (StatusCode::FORBIDDEN, json!({ "error": "forbidden" })),
            AuthError::AccountNotFound | AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "invalid credentials" }),
            ),
            AuthError::WeakSecret
            | AuthError::PasswordHash(_)
            | AuthError::Signing(_)
            | AuthError::Store(_)
            | AuthError::LifetimeOverflow => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal error" }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<tutorhub_db::DbError> for AuthError {
    fn from(e: tutorhub_db::DbError) -> Self {
        AuthError::Store(e.to_string())
    }
}
