//! CLI command handlers.

pub mod checkin;
pub mod fetch;
pub mod login;
pub mod serve;
pub mod token;

use anyhow::Result;
use droidauth_config::{Config, SharedConfigStore};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Persisted device and account state.
    pub store: SharedConfigStore,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Register the device unless a registration is already stored.
pub async fn ensure_registered(ctx: &Context) -> Result<Config> {
    let cfg = ctx.store.snapshot();
    if cfg.has_registration() {
        return Ok(cfg);
    }
    if !ctx.json_output {
        println!("Device not registered, running check-in...");
    }
    checkin::register(ctx, &droidauth_google::CheckinClient::new()).await?;
    Ok(ctx.store.snapshot())
}

/// Stored state, or an error if no login has completed.
pub fn require_login(ctx: &Context) -> Result<Config> {
    let cfg = ctx.store.snapshot();
    if !cfg.has_master_token() {
        anyhow::bail!("not logged in; run 'droidauth login' first");
    }
    Ok(cfg)
}

/// Shorten a credential for display.
pub fn mask(token: &str) -> String {
    if token.is_ascii() && token.len() > 16 {
        format!("{}...{}", &token[..8], &token[token.len() - 4..])
    } else {
        "****".to_string()
    }
}
