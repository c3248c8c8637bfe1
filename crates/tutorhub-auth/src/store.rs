//! Credential store seam

use async_trait::async_trait;
use tutorhub_db::{Account, Database};

use crate::error::AuthError;

/// Read-only account lookup used by the authenticator
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by its login identifier
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, AuthError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.get_account_by_username(identifier).await?)
    }
}
