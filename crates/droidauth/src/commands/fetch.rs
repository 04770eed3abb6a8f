//! Fetch command - requests a service token.

use anyhow::Result;
use clap::Args;
use droidauth_google::{AuthClient, ServiceRequest, TokenType};
use serde::Serialize;

use super::{Context, require_login};

/// Arguments for the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// OAuth2 scope or app shortcut (photos, youtube, gmail, drive, calendar, gms)
    pub scope: String,

    /// Package name to present as the requesting app
    #[arg(long)]
    pub app: Option<String>,

    /// Signing certificate SHA-1 of the requesting app
    #[arg(long)]
    pub sig: Option<String>,
}

#[derive(Debug, Serialize)]
struct FetchOutput {
    token: String,
    token_type: TokenType,
    email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    granted_scopes: String,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let cfg = require_login(ctx)?;
    let req = ServiceRequest::resolve(&args.scope, args.app.as_deref(), args.sig.as_deref())
        .ok_or_else(|| anyhow::anyhow!("scope must not be empty"))?;

    tracing::debug!(scope = %req.scope, app = %req.app_package, "Fetching service token");
    let resp = AuthClient::new()
        .fetch_service_token(&cfg, &req.scope, &req.app_package, &req.app_sig)
        .await
        .map_err(|e| anyhow::anyhow!("Token request failed: {}", e))?;
    let token_type = TokenType::classify(&resp.auth);

    if ctx.json_output {
        let output = FetchOutput {
            token: resp.auth,
            token_type,
            email: cfg.email,
            granted_scopes: resp.granted_scopes,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Token ({}):", token_type.label());
        println!("{}", resp.auth);
    }
    Ok(())
}
