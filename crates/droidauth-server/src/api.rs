//! Local API handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    response::{Html, IntoResponse},
};
use droidauth_google::{KNOWN_APPS, KnownApp, ServiceRequest, TokenType};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::pages::{index_page, login_page};
use crate::session::{LoginPhase, LoginSnapshot};
use crate::state::AppState;

const SCOPE_REQUIRED: &str =
    "scope is required. Try: photos, youtube, gmail, drive, calendar, or a full OAuth2 scope";

const NOT_LOGGED_IN: &str = "not logged in; run 'droidauth login' first";

/// POST body for `/api/token`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenRequest {
    /// Scope string or known-app name.
    pub scope: String,
    #[serde(alias = "app")]
    pub app_package: String,
    #[serde(alias = "sig")]
    pub app_sig: String,
}

/// Query string for `GET /api/token`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenQuery {
    pub scope: String,
    #[serde(alias = "app_package")]
    pub app: String,
    #[serde(alias = "app_sig")]
    pub sig: String,
}

/// Response for `/api/token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub email: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub granted_scopes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Response for `/api/status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub registered: bool,
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub android_id: String,
}

/// Response for `/api/proxy-extract`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Handle GET /
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(index_page(state.config.public_port))
}

/// Handle GET /login
pub async fn login(State(state): State<AppState>) -> Html<String> {
    // Opening the landing page starts a fresh attempt unless one is running.
    if state.session().phase() == LoginPhase::Resolved {
        state.reset_session();
    }
    Html(login_page())
}

/// Handle GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "droidauth",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handle GET /api/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let cfg = state.store.snapshot();
    Json(StatusResponse {
        registered: cfg.has_registration(),
        logged_in: cfg.has_master_token(),
        email: cfg.email,
        android_id: cfg.android_id,
    })
}

/// Handle GET /api/apps
pub async fn apps() -> Json<BTreeMap<&'static str, &'static KnownApp>> {
    Json(KNOWN_APPS.iter().map(|app| (app.name, app)).collect())
}

/// Handle GET /api/login-status
pub async fn login_status(State(state): State<AppState>) -> Json<LoginSnapshot> {
    Json(state.session().snapshot())
}

/// Handle POST /api/login-reset
pub async fn login_reset(State(state): State<AppState>) -> Json<LoginSnapshot> {
    Json(state.reset_session().snapshot())
}

/// Handle POST /api/proxy-extract
///
/// Called by the injected bridge when the page closes. Reports what the
/// session has captured so far without waiting on the exchange.
pub async fn proxy_extract(State(state): State<AppState>) -> Json<ExtractResponse> {
    let snap = state.session().snapshot();
    tracing::debug!(session = %snap.id, phase = ?snap.phase, "Bridge reported close");

    let error = if snap.captured {
        snap.error
    } else {
        "login cookie not captured yet".to_string()
    };
    Json(ExtractResponse {
        success: snap.captured && error.is_empty(),
        email: snap.email,
        error,
    })
}

/// Handle GET /api/token
pub async fn token_get(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenResponse>> {
    ensure_logged_in(&state)?;
    issue_token(&state, &query.scope, &query.app, &query.sig).await
}

/// Handle POST /api/token
pub async fn token_post(State(state): State<AppState>, body: Bytes) -> Result<Json<TokenResponse>> {
    ensure_logged_in(&state)?;
    let req: TokenRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("invalid JSON: {}", e)))?;
    issue_token(&state, &req.scope, &req.app_package, &req.app_sig).await
}

fn ensure_logged_in(state: &AppState) -> Result<()> {
    if state.store.snapshot().has_master_token() {
        Ok(())
    } else {
        Err(ServerError::Unauthorized(NOT_LOGGED_IN.to_string()))
    }
}

async fn issue_token(
    state: &AppState,
    scope: &str,
    app_package: &str,
    app_sig: &str,
) -> Result<Json<TokenResponse>> {
    let req = ServiceRequest::resolve(scope, Some(app_package), Some(app_sig))
        .ok_or_else(|| ServerError::BadRequest(SCOPE_REQUIRED.to_string()))?;

    let cfg = state.store.snapshot();
    tracing::info!(scope = %req.scope, app = %req.app_package, "Service token requested");
    let resp = state
        .auth
        .fetch_service_token(&cfg, &req.scope, &req.app_package, &req.app_sig)
        .await?;

    Ok(Json(TokenResponse {
        token_type: TokenType::classify(&resp.auth).to_string(),
        token: resp.auth,
        email: cfg.email,
        granted_scopes: resp.granted_scopes,
        error: String::new(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_accepts_both_spellings() {
        let long: TokenRequest = serde_json::from_str(
            r#"{"scope":"photos","app_package":"com.example.app","app_sig":"abc"}"#,
        )
        .unwrap();
        let short: TokenRequest =
            serde_json::from_str(r#"{"scope":"photos","app":"com.example.app","sig":"abc"}"#)
                .unwrap();
        assert_eq!(long.app_package, "com.example.app");
        assert_eq!(short.app_package, "com.example.app");
        assert_eq!(long.app_sig, "abc");
        assert_eq!(short.app_sig, "abc");
    }

    #[test]
    fn test_token_request_defaults() {
        let req: TokenRequest = serde_json::from_str(r#"{"scope":"gmail"}"#).unwrap();
        assert_eq!(req.scope, "gmail");
        assert!(req.app_package.is_empty());
        assert!(req.app_sig.is_empty());
    }
}
