//! Token command - shows stored account info.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde::Serialize;

use super::{Context, mask, require_login};

/// Arguments for the token command.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Print the full master token
    #[arg(long)]
    pub reveal: bool,
}

#[derive(Debug, Serialize)]
struct TokenOutput {
    email: String,
    android_id: String,
    master_token: String,
    device: String,
}

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    let cfg = require_login(ctx)?;
    let master_token = if args.reveal || ctx.json_output {
        cfg.master_token.clone()
    } else {
        mask(&cfg.master_token)
    };
    let device = format!("{} ({})", cfg.device.model, cfg.device.device);

    if ctx.json_output {
        let output = TokenOutput {
            email: cfg.email,
            android_id: cfg.android_id,
            master_token,
            device,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    println!("  {} {}", dim.apply_to("Email:"), cfg.email);
    println!("  {} {}", dim.apply_to("Android ID:"), cfg.android_id);
    println!("  {} {}", dim.apply_to("Master Token:"), master_token);
    println!("  {} {}", dim.apply_to("Device:"), device);
    if ctx.verbose {
        println!("  {} {}", dim.apply_to("Fingerprint:"), cfg.device.fingerprint);
        println!("  {} {}", dim.apply_to("SDK:"), cfg.device.sdk_version);
    }
    if !args.reveal {
        println!();
        println!("{}", dim.apply_to("Use --reveal to print the full master token."));
    }
    Ok(())
}
