//! API routes

mod accounts;
mod auth;
mod health;
pub mod metrics;
mod resources;
pub mod types;

use std::sync::Arc;

use axum::{Router, routing::MethodRouter};
use tower_http::trace::TraceLayer;
use tutorhub_auth::{AccessLevel, TokenCodec, guard};

use crate::state::{AppState, MetricsHandle};

/// The routes of one group, declared with their access level
///
/// Each method router is gated on its own, so a path may mix levels across
/// methods (public `GET`, admin `POST`) and still answer 405 for methods it
/// does not serve.
pub(crate) struct RouteGroup {
    prefix: &'static str,
    codec: Arc<TokenCodec>,
    router: Router<AppState>,
}

impl RouteGroup {
    pub(crate) fn new(prefix: &'static str, codec: &Arc<TokenCodec>) -> Self {
        Self {
            prefix,
            codec: codec.clone(),
            router: Router::new(),
        }
    }

    pub(crate) fn route(
        mut self,
        level: AccessLevel,
        path: &str,
        method_router: MethodRouter<AppState>,
    ) -> Self {
        let full_path = format!("{}{}", self.prefix, path);
        self.router = self
            .router
            .route(&full_path, guard(method_router, &self.codec, level));
        self
    }

    pub(crate) fn into_router(self) -> Router<AppState> {
        self.router
    }
}

/// Create the main router
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let codec = state.codec.clone();

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Login and registration
        .merge(auth::routes(&codec))
        // Account management
        .merge(accounts::routes(&codec))
        // Administrative resources
        .merge(resources::routes(&codec))
        .with_state(state);

    // Add metrics endpoint if handle is provided
    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router.layer(TraceLayer::new_for_http())
}
