//! Login: credential verification and token issuance

use std::sync::Arc;

use tracing::{debug, info, warn};
use tutorhub_db::Account;

use crate::error::AuthError;
use crate::jwt::{IssuedToken, TokenCodec};
use crate::password::{hash_password, verify_password};
use crate::store::CredentialStore;

/// Verified against when the account does not exist, so an unknown
/// username costs the same hash computation as a wrong password
const DUMMY_PASSWORD: &str = "timing-equalizer";

/// Turns login attempts into tokens
///
/// Holds no per-call state; every attempt reads the credential store once.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    dummy_hash: Arc<str>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Result<Self, AuthError> {
        let dummy_hash = hash_password(DUMMY_PASSWORD)?;
        Ok(Self {
            store,
            codec,
            dummy_hash: dummy_hash.into(),
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Log in with any role
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<IssuedToken, AuthError> {
        let account = self.check_credentials(identifier, secret).await?;
        self.issue(&account)
    }

    /// Log in, additionally requiring the administrator role
    ///
    /// The credential check runs first and in full, so a non-admin with the
    /// right password takes the same path as a wrong password up to here.
    pub async fn login_admin(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<IssuedToken, AuthError> {
        let account = self.check_credentials(identifier, secret).await?;

        if !account.role.is_admin() {
            warn!("Admin login refused for non-admin account: {}", account.username);
            record_login("insufficient_role");
            return Err(AuthError::InsufficientRole);
        }

        self.issue(&account)
    }

    fn issue(&self, account: &Account) -> Result<IssuedToken, AuthError> {
        let issued = self
            .codec
            .issue(account.id, &account.username, account.role)?;
        info!("Account {} logged in ({})", account.username, account.role.as_str());
        record_login("success");
        Ok(issued)
    }

    async fn check_credentials(&self, identifier: &str, secret: &str) -> Result<Account, AuthError> {
        debug!("Login attempt for account: {}", identifier);

        let account = self.store.find_by_identifier(identifier).await?;

        // Always verify, even without an account, to keep timing uniform
        let hash = match &account {
            Some(a) => a.password_hash.clone(),
            None => self.dummy_hash.to_string(),
        };
        let secret = secret.to_string();
        let valid = tokio::task::spawn_blocking(move || verify_password(&secret, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

        match (account, valid) {
            (Some(account), true) => Ok(account),
            (Some(account), false) => {
                warn!("Wrong password for account: {}", account.username);
                record_login("invalid_credentials");
                Err(AuthError::InvalidCredentials)
            }
            (None, _) => {
                warn!("Login attempt for unknown account: {}", identifier);
                record_login("account_not_found");
                Err(AuthError::AccountNotFound)
            }
        }
    }
}

fn record_login(outcome: &'static str) {
    metrics::counter!("tutorhub_logins_total", "outcome" => outcome).increment(1);
}
