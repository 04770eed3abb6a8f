//! droidauth - Android device login and token relay
//!
//! Main entry point for the droidauth CLI.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{checkin, fetch, login, serve, token};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// droidauth - sign in as an Android device and hand out service tokens
#[derive(Parser)]
#[command(name = "droidauth")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// State file (default: <config dir>/droidauth/config.yaml)
    #[arg(long, global = true, env = droidauth_config::CONFIG_FILE_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register this emulated device
    Checkin(checkin::CheckinArgs),

    /// Sign in through the local login proxy
    Login(login::LoginArgs),

    /// Show stored account info
    Token(token::TokenArgs),

    /// Fetch a service token
    Fetch(fetch::FetchArgs),

    /// Run the local token API server
    Serve(serve::ServeArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "droidauth=debug,droidauth_google=debug,droidauth_server=debug,droidauth_config=debug,info"
    } else {
        "droidauth=info,droidauth_google=info,droidauth_server=info,warn"
    };

    let log_dir = droidauth_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "droidauth.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "droidauth=trace,droidauth_google=trace,droidauth_server=trace,droidauth_config=trace,info",
                )),
        )
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => droidauth_config::default_config_path()?,
    };
    let store = droidauth_config::ConfigStore::open(config_path.clone())?;
    tracing::debug!(path = %config_path.display(), "Loaded state");

    let ctx = commands::Context {
        store: Arc::new(store),
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Checkin(args) => checkin::run(args, &ctx).await,
        Commands::Login(args) => login::run(args, &ctx).await,
        Commands::Token(args) => token::run(args, &ctx).await,
        Commands::Fetch(args) => fetch::run(args, &ctx).await,
        Commands::Serve(args) => serve::run(args, &ctx).await,
    }
}
