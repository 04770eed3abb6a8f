//! Application state shared across handlers.

use std::sync::Arc;

use droidauth_config::SharedConfigStore;
use droidauth_google::AuthClient;
use parking_lot::RwLock;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::exchange::{GoogleMasterExchange, SharedExchange};
use crate::session::{LoginOutcome, LoginSession};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Persisted device and account state.
    pub store: SharedConfigStore,

    /// Client for service-token requests.
    pub auth: AuthClient,

    /// Exchange run after a login cookie is captured.
    pub exchange: SharedExchange,

    /// Client for proxied requests. Never follows redirects.
    pub upstream: reqwest::Client,

    /// Current login session. Replaced on reset.
    session: Arc<RwLock<Arc<LoginSession>>>,
}

impl AppState {
    /// Create state with the production auth client and exchange.
    pub fn new(config: ServerConfig, store: SharedConfigStore) -> Result<Self> {
        Self::with_auth_client(config, store, AuthClient::new())
    }

    /// Create state around a specific auth client.
    pub fn with_auth_client(
        config: ServerConfig,
        store: SharedConfigStore,
        auth: AuthClient,
    ) -> Result<Self> {
        let upstream = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        let exchange: SharedExchange =
            Arc::new(GoogleMasterExchange::new(auth.clone(), store.clone()));

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
            exchange,
            upstream,
            session: Arc::new(RwLock::new(Arc::new(LoginSession::new()))),
        })
    }

    /// Replace the exchange run after capture.
    pub fn with_exchange(mut self, exchange: SharedExchange) -> Self {
        self.exchange = exchange;
        self
    }

    /// Replace the client used for proxied requests.
    pub fn with_upstream(mut self, upstream: reqwest::Client) -> Self {
        self.upstream = upstream;
        self
    }

    /// The current login session.
    pub fn session(&self) -> Arc<LoginSession> {
        self.session.read().clone()
    }

    /// Discard the current session and start a fresh one.
    pub fn reset_session(&self) -> Arc<LoginSession> {
        let fresh = Arc::new(LoginSession::new());
        let old = std::mem::replace(&mut *self.session.write(), fresh.clone());
        old.abandon();
        tracing::info!(old = %old.id(), new = %fresh.id(), "Login session reset");
        fresh
    }

    /// Wait until a login session resolves, following resets.
    pub async fn wait_for_login(&self) -> LoginOutcome {
        loop {
            match self.session().wait_resolved().await {
                LoginOutcome::Abandoned => continue,
                outcome => return outcome,
            }
        }
    }
}
