//! Master-token exchange triggered by a captured login cookie.

use std::sync::Arc;

use async_trait::async_trait;
use droidauth_config::SharedConfigStore;
use droidauth_google::AuthClient;

use crate::error::Result;

/// Shared exchange implementation.
pub type SharedExchange = Arc<dyn MasterTokenExchange>;

// ============================================================================
// MasterTokenExchange Trait
// ============================================================================

/// Turns a captured one-time login token into a stored master token.
#[async_trait]
pub trait MasterTokenExchange: Send + Sync + std::fmt::Debug {
    /// Exchange `oauth_token` and persist the result. Returns the account email.
    ///
    /// Nothing is persisted on failure.
    async fn exchange(&self, oauth_token: &str) -> Result<String>;
}

// ============================================================================
// GoogleMasterExchange
// ============================================================================

/// Production exchange: the auth endpoint, then the state file.
#[derive(Debug, Clone)]
pub struct GoogleMasterExchange {
    client: AuthClient,
    store: SharedConfigStore,
}

impl GoogleMasterExchange {
    pub fn new(client: AuthClient, store: SharedConfigStore) -> Self {
        Self { client, store }
    }
}

#[async_trait]
impl MasterTokenExchange for GoogleMasterExchange {
    async fn exchange(&self, oauth_token: &str) -> Result<String> {
        let state = self.store.snapshot();
        tracing::info!(token_len = oauth_token.len(), "Exchanging login token for master token");

        let resp = self.client.exchange_for_master(&state, oauth_token).await?;
        let master = resp.master_token().to_string();
        let email = resp.email.clone();

        self.store.update(|cfg| {
            cfg.master_token = master;
            cfg.email = email.clone();
        })?;

        tracing::info!(email = %email, "Master token saved");
        Ok(email)
    }
}
