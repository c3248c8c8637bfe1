//! Administrative resource routes
//!
//! All eight resource groups share one set of handlers. Each group's router
//! carries its [`ResourceKind`] as a request extension.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Map, Value};
use tracing::{debug, info};
use tutorhub_auth::{AccessLevel, AuthUser, TokenCodec};
use tutorhub_db::{Resource, ResourceFilter, ResourceKind};

use crate::error::ApiError;
use crate::state::AppState;

use super::RouteGroup;
use super::types::{
    AccountTransactionsRequest, IdQuery, IdRequest, TransactionStatsResponse,
    UpdateResourceRequest, UpdateStatusRequest,
};

fn not_found(kind: ResourceKind, id: i64) -> ApiError {
    ApiError::NotFound(format!("{}: {}", kind, id))
}

// ==================== Generic Handlers ====================

/// GET /index
async fn list(
    Extension(kind): Extension<ResourceKind>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(state.db.list_resources(kind).await?))
}

/// GET /id?id=
async fn find_by_id(
    Extension(kind): Extension<ResourceKind>,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Resource>, ApiError> {
    state
        .db
        .get_resource(kind, query.id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(kind, query.id))
}

/// POST /index (Admin only)
async fn insert(
    admin: AuthUser,
    Extension(kind): Extension<ResourceKind>,
    State(state): State<AppState>,
    Json(data): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    let resource = state.db.insert_resource(kind, data).await?;
    info!("{} {} created by {}", kind, resource.id, admin.username);
    Ok((StatusCode::CREATED, Json(resource)))
}

/// POST /edit (Admin only)
async fn update(
    admin: AuthUser,
    Extension(kind): Extension<ResourceKind>,
    State(state): State<AppState>,
    Json(request): Json<UpdateResourceRequest>,
) -> Result<Json<Resource>, ApiError> {
    debug!("Updating {} {}", kind, request.id);

    let resource = state
        .db
        .update_resource(kind, request.id, request.data)
        .await?
        .ok_or_else(|| not_found(kind, request.id))?;

    info!("{} {} updated by {}", kind, resource.id, admin.username);
    Ok(Json(resource))
}

/// POST /remove (Admin only)
async fn remove(
    admin: AuthUser,
    Extension(kind): Extension<ResourceKind>,
    State(state): State<AppState>,
    Json(request): Json<IdRequest>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_resource(kind, request.id).await? {
        info!("{} {} deleted by {}", kind, request.id, admin.username);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(kind, request.id))
    }
}

/// GET /filter?field=value
async fn filter(
    Extension(kind): Extension<ResourceKind>,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let filter: ResourceFilter = params.into_iter().collect();
    Ok(Json(state.db.filter_resources(kind, &filter).await?))
}

// ==================== Group-specific Handlers ====================

/// POST /v1/new_class/status (Admin only)
async fn update_status(
    admin: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Resource>, ApiError> {
    let kind = ResourceKind::NewClass;
    let resource = state
        .db
        .patch_resource(kind, request.id, "status", request.status)
        .await?
        .ok_or_else(|| not_found(kind, request.id))?;

    info!("{} {} status set by {}", kind, resource.id, admin.username);
    Ok(Json(resource))
}

/// POST /v1/trans/id (Admin only)
async fn transactions_for_account(
    State(state): State<AppState>,
    Json(request): Json<AccountTransactionsRequest>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let filter = ResourceFilter::new().with("account_id", request.account_id.to_string());
    Ok(Json(
        state
            .db
            .filter_resources(ResourceKind::Transaction, &filter)
            .await?,
    ))
}

/// GET /v1/trans/statistical (Admin only)
async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<TransactionStatsResponse>, ApiError> {
    let totals = state
        .db
        .resource_totals(ResourceKind::Transaction, "amount")
        .await?;

    Ok(Json(TransactionStatsResponse {
        count: totals.count,
        total_amount: totals.total,
    }))
}

// ==================== Route Groups ====================

/// Insert, edit and remove are admin-only for every group; listing is public
fn crud_group(prefix: &'static str, id_level: AccessLevel, codec: &Arc<TokenCodec>) -> RouteGroup {
    RouteGroup::new(prefix, codec)
        .route(AccessLevel::Public, "/index", get(list))
        .route(AccessLevel::AdminOnly, "/index", post(insert))
        .route(id_level, "/id", get(find_by_id))
        .route(AccessLevel::AdminOnly, "/edit", post(update))
        .route(AccessLevel::AdminOnly, "/remove", post(remove))
}

fn with_filter(group: RouteGroup) -> RouteGroup {
    group.route(AccessLevel::Public, "/filter", get(filter))
}

fn finish(group: RouteGroup, kind: ResourceKind) -> Router<AppState> {
    group.into_router().layer(Extension(kind))
}

/// Create resource routes
pub fn routes(codec: &Arc<TokenCodec>) -> Router<AppState> {
    use AccessLevel::{Authenticated, Public};

    let subject = crud_group("/v1/subject", Public, codec);
    let class = crud_group("/v1/class", Authenticated, codec);
    let category = with_filter(crud_group("/v1/category", Authenticated, codec));
    let post_group = with_filter(crud_group("/v1/post", Authenticated, codec));
    let salary_info = with_filter(crud_group("/v1/salaryinfo", Authenticated, codec));
    let tutor = with_filter(crud_group("/v1/tutor", Authenticated, codec));
    let new_class = with_filter(crud_group("/v1/new_class", Authenticated, codec))
        .route(AccessLevel::AdminOnly, "/status", post(update_status));

    let transaction = RouteGroup::new("/v1/trans", codec)
        .route(AccessLevel::Public, "/index", get(list))
        .route(AccessLevel::AdminOnly, "/index", post(insert))
        .route(AccessLevel::AdminOnly, "/id", post(transactions_for_account))
        .route(AccessLevel::Public, "/filter", get(filter))
        .route(AccessLevel::AdminOnly, "/statistical", get(statistics));

    Router::new()
        .merge(finish(subject, ResourceKind::Subject))
        .merge(finish(class, ResourceKind::Class))
        .merge(finish(category, ResourceKind::Category))
        .merge(finish(post_group, ResourceKind::Post))
        .merge(finish(salary_info, ResourceKind::SalaryInfo))
        .merge(finish(tutor, ResourceKind::Tutor))
        .merge(finish(new_class, ResourceKind::NewClass))
        .merge(finish(transaction, ResourceKind::Transaction))
}
