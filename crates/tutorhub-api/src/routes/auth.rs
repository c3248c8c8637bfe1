//! Login, registration and identity routes

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::{debug, info};
use tutorhub_auth::{AccessLevel, AuthError, AuthUser, IssuedToken, TokenCodec, hash_password};
use tutorhub_db::{NewAccount, Role};

use crate::error::ApiError;
use crate::state::AppState;

use super::RouteGroup;
use super::types::{AccountResponse, LoginRequest, LoginResponse, RegisterRequest};

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate username format and length
pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Oversized credentials cannot belong to any account; they are refused
/// before hashing, with the ordinary login rejection
fn check_login_input(request: &LoginRequest) -> Result<(), ApiError> {
    if request.username.is_empty()
        || request.username.len() > MAX_USERNAME_LENGTH
        || request.password.len() > MAX_PASSWORD_LENGTH
    {
        return Err(ApiError::login(AuthError::InvalidCredentials));
    }
    Ok(())
}

fn login_response(issued: IssuedToken) -> Json<LoginResponse> {
    Json(LoginResponse {
        expires_in: issued.expires_in(),
        role: issued.claims.role.as_str().to_string(),
        token: issued.token,
    })
}

// ==================== Auth Routes ====================

/// POST /v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    check_login_input(&request)?;

    let issued = state
        .auth
        .login(&request.username, &request.password)
        .await
        .map_err(ApiError::login)?;

    Ok(login_response(issued))
}

/// POST /v1/auth/login-admin
async fn login_admin(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    check_login_input(&request)?;

    let issued = state
        .auth
        .login_admin(&request.username, &request.password)
        .await
        .map_err(ApiError::login)?;

    Ok(login_response(issued))
}

/// POST /v1/auth/register
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;

    debug!("Registering account: {}", request.username);

    let password_hash = hash_password(&request.password)?;

    // Self-registration never grants the admin role
    let account = state
        .db
        .insert_account(NewAccount {
            username: request.username,
            password_hash,
            role: Role::User,
            full_name: request.full_name,
            email: request.email,
            phone: request.phone,
        })
        .await?;

    info!("Registered account: {}", account.username);

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// GET /v1/auth/me
async fn me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}

/// Create auth routes
pub fn routes(codec: &Arc<TokenCodec>) -> Router<AppState> {
    RouteGroup::new("/v1/auth", codec)
        .route(AccessLevel::Public, "/login", post(login))
        .route(AccessLevel::Public, "/login-admin", post(login_admin))
        .route(AccessLevel::Public, "/register", post(register))
        .route(AccessLevel::Authenticated, "/me", get(me))
        .into_router()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("tutor_01-b").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(257)).is_err());
    }

    #[test]
    fn test_oversized_login_is_a_plain_rejection() {
        let request = LoginRequest {
            username: "alice".to_string(),
            password: "p".repeat(MAX_PASSWORD_LENGTH + 1),
        };
        let err = check_login_input(&request).unwrap_err();
        assert!(matches!(err, ApiError::Auth(AuthError::InvalidCredentials)));
    }
}
