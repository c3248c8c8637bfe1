//! Access gate middleware for Axum
//!
//! Every protected route carries one [`AccessLevel`]. A single decision
//! function, [`authorize`], runs for all of them:
//!
//! 1. extract the bearer token (`MissingToken` when absent or empty),
//! 2. verify it with the [`TokenCodec`] (`Malformed`, `InvalidSignature`,
//!    `Expired`),
//! 3. compare the token's role with the level's required role
//!    (`InsufficientRole`),
//! 4. admit the request with an [`AuthUser`] in its extensions.
//!
//! The gate only reads; it never touches the credential store.

use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tutorhub_db::Role;

use crate::error::AuthError;
use crate::jwt::{Claims, TokenCodec};

/// Enforcement level attached to a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    /// No token required
    Public,
    /// Any valid token
    Authenticated,
    /// A valid token carrying the admin role
    AdminOnly,
}

impl AccessLevel {
    /// Role a token must satisfy, if any
    pub fn required_role(&self) -> Option<Role> {
        match self {
            AccessLevel::Public => None,
            AccessLevel::Authenticated => Some(Role::User),
            AccessLevel::AdminOnly => Some(Role::Admin),
        }
    }
}

/// Authenticated account information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthUser {
    /// Create from JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.uid,
            username: claims.sub.clone(),
            role: claims.role,
        }
    }
}

/// Extract bearer token from the authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// Decide whether a request may pass a route guarded by `level`
///
/// Returns the admitted identity, or `None` for public routes.
pub fn authorize(
    codec: &TokenCodec,
    headers: &HeaderMap,
    level: AccessLevel,
) -> Result<Option<AuthUser>, AuthError> {
    let Some(required) = level.required_role() else {
        return Ok(None);
    };

    let token = extract_bearer_token(headers)?;
    let claims = codec.verify(token)?;

    if !claims.role.satisfies(required) {
        return Err(AuthError::InsufficientRole);
    }

    Ok(Some(AuthUser::from_claims(&claims)))
}

/// Middleware state: the codec plus the level of the guarded routes
#[derive(Clone, Debug)]
pub struct AccessGate {
    codec: Arc<TokenCodec>,
    level: AccessLevel,
}

impl AccessGate {
    pub fn new(codec: Arc<TokenCodec>, level: AccessLevel) -> Self {
        Self { codec, level }
    }

    pub fn level(&self) -> AccessLevel {
        self.level
    }
}

/// Access gate middleware
///
/// Rejections short-circuit with the error's response; the handler never
/// runs. On success the [`AuthUser`] is added to request extensions.
pub async fn access_gate(
    State(gate): State<AccessGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match authorize(&gate.codec, request.headers(), gate.level) {
        Ok(Some(user)) => {
            debug!("Authenticated account: {} ({})", user.username, user.role.as_str());
            request.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => {
            warn!(
                reason = e.kind(),
                path = %request.uri().path(),
                "Request rejected by access gate"
            );
            metrics::counter!("tutorhub_gate_rejections_total", "reason" => e.kind())
                .increment(1);
            return Err(e);
        }
    }

    Ok(next.run(request).await)
}

/// Guard every route of `router` with `level`
///
/// Public and empty routers are returned untouched.
pub fn protect<S>(router: Router<S>, codec: &Arc<TokenCodec>, level: AccessLevel) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if level == AccessLevel::Public || !router.has_routes() {
        return router;
    }
    router.route_layer(middleware::from_fn_with_state(
        AccessGate::new(codec.clone(), level),
        access_gate,
    ))
}

/// Guard the handlers of one method router with `level`
///
/// Only the registered methods are gated. The method router's fallback is
/// left alone, so an unsupported method still answers 405 once the router
/// is merged with routers of other levels on the same path.
pub fn guard<S>(
    method_router: MethodRouter<S>,
    codec: &Arc<TokenCodec>,
    level: AccessLevel,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    match level {
        AccessLevel::Public => method_router,
        AccessLevel::Authenticated | AccessLevel::AdminOnly => method_router.route_layer(
            middleware::from_fn_with_state(AccessGate::new(codec.clone(), level), access_gate),
        ),
    }
}

/// Handlers behind the gate receive the admitted identity by extraction
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}
