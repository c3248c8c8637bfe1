//! Account management routes

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::{debug, info};
use tutorhub_auth::{AccessLevel, AuthUser, TokenCodec, hash_password};
use tutorhub_db::{AccountProfile, ResourceFilter, Role};

use crate::error::ApiError;
use crate::state::AppState;

use super::RouteGroup;
use super::auth::validate_password;
use super::types::{
    AccountResponse, ChangePasswordRequest, IdQuery, IdRequest, UpdateAccountRequest,
};

async fn fetch_account(state: &AppState, id: i64) -> Result<AccountResponse, ApiError> {
    state
        .db
        .get_account_by_id(id)
        .await?
        .map(AccountResponse::from)
        .ok_or_else(|| ApiError::NotFound(format!("Account: {}", id)))
}

/// GET /v1/account/index
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.db.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// GET /v1/account/id?id=
async fn get_account(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<AccountResponse>, ApiError> {
    Ok(Json(fetch_account(&state, query.id).await?))
}

/// POST /v1/account/edit (Admin only)
async fn update_account(
    admin: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    debug!("Updating account: {}", request.id);

    let role = request
        .role
        .as_deref()
        .map(|r| {
            r.parse::<Role>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid role: {}", r)))
        })
        .transpose()?;

    let profile = AccountProfile {
        full_name: request.full_name,
        email: request.email,
        phone: request.phone,
    };
    if !state.db.update_account_profile(request.id, profile).await? {
        return Err(ApiError::NotFound(format!("Account: {}", request.id)));
    }

    if let Some(role) = role {
        state.db.update_account_role(request.id, role).await?;
    }

    let account = fetch_account(&state, request.id).await?;
    info!("Account {} updated by {}", account.username, admin.username);

    Ok(Json(account))
}

/// POST /v1/account/remove (Admin only)
async fn delete_account(
    admin: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<IdRequest>,
) -> Result<StatusCode, ApiError> {
    debug!("Deleting account: {}", request.id);

    if state.db.delete_account(request.id).await? {
        info!("Account {} deleted by {}", request.id, admin.username);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Account: {}", request.id)))
    }
}

/// GET /v1/account/filter?field=value
async fn filter_accounts(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let filter: ResourceFilter = params.into_iter().collect();

    let mut matched = Vec::new();
    for account in state.db.list_accounts().await? {
        let response = AccountResponse::from(account);
        let document = serde_json::to_value(&response)
            .map_err(|e| ApiError::Internal(format!("Account encoding failed: {}", e)))?;
        if document.as_object().is_some_and(|doc| filter.matches(doc)) {
            matched.push(response);
        }
    }

    Ok(Json(matched))
}

/// POST /v1/account/password (Admin only)
async fn change_password(
    admin: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validate_password(&request.password)?;

    let password_hash = hash_password(&request.password)?;
    if !state
        .db
        .update_account_password(request.id, &password_hash)
        .await?
    {
        return Err(ApiError::NotFound(format!("Account: {}", request.id)));
    }

    info!("Password of account {} changed by {}", request.id, admin.username);
    Ok(StatusCode::NO_CONTENT)
}

/// Create account routes
pub fn routes(codec: &Arc<TokenCodec>) -> Router<AppState> {
    RouteGroup::new("/v1/account", codec)
        .route(AccessLevel::Public, "/index", get(list_accounts))
        .route(AccessLevel::Authenticated, "/id", get(get_account))
        .route(AccessLevel::AdminOnly, "/edit", post(update_account))
        .route(AccessLevel::AdminOnly, "/remove", post(delete_account))
        .route(AccessLevel::Public, "/filter", get(filter_accounts))
        .route(AccessLevel::AdminOnly, "/password", post(change_password))
        .into_router()
}
