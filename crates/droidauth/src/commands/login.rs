//! Login command - signs in through the local login proxy.

use anyhow::Result;
use clap::Args;
use droidauth_server::{ApiServer, AppState, LoginOutcome, ServerConfig};
use serde::Serialize;

use super::{Context, ensure_registered};

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Port for the login proxy (overrides stored server_port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Print the login URL instead of opening a browser
    #[arg(long)]
    pub no_open: bool,
}

#[derive(Debug, Serialize)]
struct LoginOutput {
    success: bool,
    email: String,
}

/// Run the login command.
pub async fn run(args: LoginArgs, ctx: &Context) -> Result<()> {
    let cfg = ensure_registered(ctx).await?;
    let port = args.port.unwrap_or(cfg.server_port);

    let state = AppState::new(ServerConfig::new(port), ctx.store.clone())?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let addr = ApiServer::new(state.clone())
        .run_with_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await?;

    let url = format!("http://localhost:{}/login", addr.port());
    if !ctx.json_output {
        println!("Google Sign-In");
        println!("==============");
        println!();
        println!("Open this URL in your browser and sign in:");
        println!();
        println!("  {}", url);
        println!();
    }
    if !args.no_open && open_url(&url).is_err() && !ctx.json_output {
        println!("(Could not open browser automatically)");
        println!();
    }
    if !ctx.json_output {
        println!("Waiting for sign-in to complete (Ctrl-C to cancel)...");
    }

    let outcome = tokio::select! {
        outcome = state.wait_for_login() => outcome,
        _ = tokio::signal::ctrl_c() => LoginOutcome::Abandoned,
    };
    shutdown_tx.send(()).ok();

    match outcome {
        LoginOutcome::Success { email } => {
            if ctx.json_output {
                let output = LoginOutput {
                    success: true,
                    email,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!();
                println!("Login successful!");
                println!("  Email: {}", email);
                println!();
                println!("Run 'droidauth fetch <scope>' to get a service token.");
            }
            Ok(())
        }
        LoginOutcome::Failed { error } => Err(anyhow::anyhow!("Login failed: {}", error)),
        LoginOutcome::Abandoned => Err(anyhow::anyhow!("Login cancelled")),
    }
}

/// Try to open a URL in the default browser.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }
    Ok(())
}
