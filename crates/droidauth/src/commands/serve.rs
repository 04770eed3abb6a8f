//! Serve command - runs the local token API server.

use anyhow::Result;
use clap::Args;
use droidauth_server::{ApiServer, AppState, ServerConfig};

use super::{Context, ensure_registered};

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides stored server_port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let cfg = ensure_registered(ctx).await?;
    if !cfg.has_master_token() {
        tracing::warn!("Not logged in; /api/token will fail until 'droidauth login' completes");
    }

    let port = args.port.unwrap_or(cfg.server_port);
    let state = AppState::new(ServerConfig::new(port), ctx.store.clone())?;

    println!("Token server on http://localhost:{}", port);
    println!("  GET  /api/status");
    println!("  GET  /api/token?scope=photos");
    println!("  POST /api/token {{\"scope\": \"gmail\"}}");
    println!("Press Ctrl-C to stop.");

    ApiServer::new(state).run().await?;
    Ok(())
}
