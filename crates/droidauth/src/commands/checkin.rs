//! Checkin command - registers the emulated device.

use anyhow::Result;
use clap::Args;
use droidauth_google::{CheckinClient, CheckinResult};
use serde::Serialize;

use super::Context;

/// Arguments for the checkin command.
#[derive(Args, Debug)]
pub struct CheckinArgs {}

#[derive(Debug, Serialize)]
struct CheckinOutput {
    android_id: String,
    security_token: String,
}

/// Run the checkin command.
pub async fn run(_args: CheckinArgs, ctx: &Context) -> Result<()> {
    if !ctx.json_output {
        println!("Registering device...");
    }
    register(ctx, &CheckinClient::new()).await?;

    let cfg = ctx.store.snapshot();
    if ctx.json_output {
        let output = CheckinOutput {
            android_id: cfg.android_id,
            security_token: cfg.security_token,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Check-in successful!");
        println!("  GSF ID: {}", cfg.android_id);
        println!("  Security Token: {}", cfg.security_token);
    }
    Ok(())
}

/// Run a check-in and persist the result. Stored state is untouched on failure.
pub async fn register(ctx: &Context, client: &CheckinClient) -> Result<CheckinResult> {
    let device = ctx.store.snapshot().device;
    let result = client
        .checkin(&device)
        .await
        .map_err(|e| anyhow::anyhow!("Check-in failed: {}", e))?;

    ctx.store
        .update(|cfg| cfg.set_registration(result.android_id, result.security_token))?;
    tracing::info!(android_id = %format!("{:x}", result.android_id), "Device registered");
    Ok(result)
}
