//! Application state

use std::sync::Arc;

use tutorhub_auth::{AuthError, Authenticator, TokenCodec};
use tutorhub_db::Database;

/// Prometheus handle used to render `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub auth: Authenticator,
    pub codec: Arc<TokenCodec>,
}

impl AppState {
    /// Wire the authenticator to the database as its credential store
    pub fn new(db: Database, codec: Arc<TokenCodec>) -> Result<Self, AuthError> {
        let auth = Authenticator::new(Arc::new(db.clone()), codec.clone())?;
        Ok(Self { db, auth, codec })
    }
}
