//! Token exchange against the Android auth endpoint.
//!
//! Two operations share one request shape: trading a one-time login token
//! for a master token, and trading the master token for a scoped service
//! token. Both POST a form and parse a `key=value` line body.

use std::collections::BTreeMap;
use std::time::Duration;

use droidauth_config::Config;
use reqwest::{Client, header};
use serde::Serialize;

use crate::apps::{GMS_PACKAGE, GMS_SIGNATURE, MASTER_SERVICE};
use crate::compression::{gunzip, is_gzip_encoding};
use crate::error::{GoogleError, Result, snippet};

/// Token exchange endpoint.
pub const AUTH_URL: &str = "https://android.googleapis.com/auth";

/// Play services version reported in every request.
const GMS_VERSION: &str = "224714044";

/// Configuration for the auth client.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub country: String,
    pub lang: String,
    pub gms_version: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            endpoint: AUTH_URL.to_string(),
            timeout: Duration::from_secs(30),
            country: "us".to_string(),
            lang: "en_US".to_string(),
            gms_version: GMS_VERSION.to_string(),
        }
    }
}

/// Parsed `key=value` response from the auth endpoint.
///
/// Every pair lands in `raw_fields`, recognised or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthResponse {
    pub auth: String,
    pub token: String,
    pub email: String,
    pub sid: String,
    pub lsid: String,
    pub services: String,
    pub first_name: String,
    pub last_name: String,
    pub account_id: String,
    pub expiry: Option<i64>,
    pub issue_advice: String,
    pub granted_scopes: String,
    pub error: String,
    pub raw_fields: BTreeMap<String, String>,
}

impl AuthResponse {
    /// Parse a response body. Lines without a key before `=` are skipped.
    pub fn parse(body: &str) -> Self {
        let mut resp = Self::default();

        for line in body.lines() {
            let line = line.trim();
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.is_empty() {
                continue;
            }

            match key {
                "Auth" => resp.auth = value.to_string(),
                "Token" => resp.token = value.to_string(),
                "Email" => resp.email = value.to_string(),
                "SID" => resp.sid = value.to_string(),
                "LSID" => resp.lsid = value.to_string(),
                "services" => resp.services = value.to_string(),
                "firstName" => resp.first_name = value.to_string(),
                "lastName" => resp.last_name = value.to_string(),
                "accountId" => resp.account_id = value.to_string(),
                "Expiry" => resp.expiry = value.parse().ok(),
                "issueAdvice" => resp.issue_advice = value.to_string(),
                "grantedScopes" => resp.granted_scopes = value.to_string(),
                "Error" => resp.error = value.to_string(),
                _ => {}
            }
            resp.raw_fields.insert(key.to_string(), value.to_string());
        }

        resp
    }

    /// The long-lived token: `Token` when present, else `Auth`.
    pub fn master_token(&self) -> &str {
        if self.token.is_empty() {
            &self.auth
        } else {
            &self.token
        }
    }

    fn failure_reason(&self) -> String {
        if self.error.is_empty() {
            "no token in response".to_string()
        } else {
            self.error.clone()
        }
    }
}

/// Client for the auth endpoint.
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    config: AuthConfig,
}

impl AuthClient {
    pub fn new() -> Self {
        Self::with_config(AuthConfig::default())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Exchange a one-time login token for a master token.
    ///
    /// Fails with [`GoogleError::EmptyToken`] when a 200 response carries
    /// neither `Token` nor `Auth`.
    pub async fn exchange_for_master(&self, state: &Config, oauth_token: &str) -> Result<AuthResponse> {
        let mut form = self.base_form(state);
        form.extend([
            ("service", MASTER_SERVICE.to_string()),
            ("source", "android".to_string()),
            ("app", GMS_PACKAGE.to_string()),
            ("client_sig", GMS_SIGNATURE.to_string()),
            ("callerPkg", GMS_PACKAGE.to_string()),
            ("callerSig", GMS_SIGNATURE.to_string()),
            ("Token", oauth_token.to_string()),
            ("ACCESS_TOKEN", "1".to_string()),
            ("add_account", "1".to_string()),
            ("get_accountid", "1".to_string()),
            ("is_called_from_account_manager", "1".to_string()),
        ]);

        let resp = self.send(state, GMS_PACKAGE, &form).await?;
        if resp.master_token().is_empty() {
            return Err(GoogleError::EmptyToken(resp.failure_reason()));
        }
        Ok(resp)
    }

    /// Fetch a service token for `scope`, presenting as `app_package`.
    pub async fn fetch_service_token(
        &self,
        state: &Config,
        scope: &str,
        app_package: &str,
        app_sig: &str,
    ) -> Result<AuthResponse> {
        if !state.has_master_token() {
            return Err(GoogleError::NoMasterToken);
        }

        let mut form = self.base_form(state);
        form.extend([
            ("Email", state.email.clone()),
            ("service", scope.to_string()),
            ("source", "android".to_string()),
            ("app", app_package.to_string()),
            ("client_sig", app_sig.to_string()),
            ("callerPkg", app_package.to_string()),
            ("callerSig", app_sig.to_string()),
            ("Token", state.master_token.clone()),
            ("system_partition", "1".to_string()),
            ("has_permission", "1".to_string()),
        ]);

        let resp = self.send(state, app_package, &form).await?;
        if resp.auth.is_empty() {
            return Err(GoogleError::EmptyToken(resp.failure_reason()));
        }
        Ok(resp)
    }

    fn base_form(&self, state: &Config) -> Vec<(&'static str, String)> {
        vec![
            ("androidId", state.android_id.clone()),
            ("sdk_version", state.device.sdk_version.to_string()),
            ("device_country", self.config.country.clone()),
            ("operatorCountry", self.config.country.clone()),
            ("lang", self.config.lang.clone()),
            ("google_play_services_version", self.config.gms_version.clone()),
            ("accountType", "HOSTED_OR_GOOGLE".to_string()),
        ]
    }

    async fn send(
        &self,
        state: &Config,
        app: &str,
        form: &[(&'static str, String)],
    ) -> Result<AuthResponse> {
        let service = form
            .iter()
            .find(|(k, _)| *k == "service")
            .map(|(_, v)| v.as_str())
            .unwrap_or_default();
        tracing::debug!(endpoint = %self.config.endpoint, service, app, "Auth request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(header::ACCEPT_ENCODING, "gzip")
            .header(header::USER_AGENT, state.auth_user_agent())
            .header("app", app)
            .header("device", &state.android_id)
            .header(header::CONNECTION, "Keep-Alive")
            .timeout(self.config.timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                GoogleError::Network(format!("{} request failed: {}", self.config.endpoint, e))
            })?;

        let status = response.status();
        let gzipped = response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_gzip_encoding);
        let raw = response.bytes().await?;
        let raw = if gzipped && !raw.is_empty() {
            match gunzip(&raw) {
                Ok(decoded) => decoded,
                // A rejection still reports its status, whatever the body holds.
                Err(_) if status != reqwest::StatusCode::OK => raw.to_vec(),
                Err(e) => return Err(GoogleError::Compression(e.to_string())),
            }
        } else {
            raw.to_vec()
        };
        let body = String::from_utf8_lossy(&raw);

        tracing::debug!(status = status.as_u16(), body_len = body.len(), "Auth response");
        let parsed = AuthResponse::parse(&body);

        if status != reqwest::StatusCode::OK {
            let error = if parsed.error.is_empty() {
                snippet(&body)
            } else {
                parsed.error.clone()
            };
            tracing::warn!(status = status.as_u16(), error = %error, "Auth request rejected");
            return Err(GoogleError::ExchangeFailed {
                status: status.as_u16(),
                error,
            });
        }

        Ok(parsed)
    }
}

impl Default for AuthClient {
    fn default() -> Self {
        Self::new()
    }
}
