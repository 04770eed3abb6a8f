//! Known apps, scope resolution, and token classification.

use serde::Serialize;

/// Package of Google Play services.
pub const GMS_PACKAGE: &str = "com.google.android.gms";

/// Signing certificate digest of Google Play services.
pub const GMS_SIGNATURE: &str = "38918a453d07199354f8b19af05ec6562ced5788";

/// Signing certificate digest shared by Google first-party apps.
pub const GOOGLE_SIGNATURE: &str = "24bb24c05e47e0aefa68a58a766179d9b613a600";

/// Scope used for the master-token exchange.
pub const MASTER_SERVICE: &str = "ac2dm";

/// A shortcut mapping a short name to a package and scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnownApp {
    pub name: &'static str,
    pub display_name: &'static str,
    pub package: &'static str,
    pub scope: &'static str,
}

/// Apps addressable by short name.
pub const KNOWN_APPS: &[KnownApp] = &[
    KnownApp {
        name: "photos",
        display_name: "Google Photos",
        package: "com.google.android.apps.photos",
        scope: "oauth2:openid https://www.googleapis.com/auth/mobileapps.native https://www.googleapis.com/auth/photos.native",
    },
    KnownApp {
        name: "youtube",
        display_name: "YouTube",
        package: "com.google.android.youtube",
        scope: "oauth2:https://www.googleapis.com/auth/youtube",
    },
    KnownApp {
        name: "gmail",
        display_name: "Gmail",
        package: "com.google.android.gm",
        scope: "oauth2:https://mail.google.com/",
    },
    KnownApp {
        name: "drive",
        display_name: "Google Drive",
        package: "com.google.android.apps.docs",
        scope: "oauth2:https://www.googleapis.com/auth/drive",
    },
    KnownApp {
        name: "calendar",
        display_name: "Google Calendar",
        package: "com.google.android.calendar",
        scope: "oauth2:https://www.googleapis.com/auth/calendar",
    },
    KnownApp {
        name: "gms",
        display_name: "Google Play services",
        package: GMS_PACKAGE,
        scope: MASTER_SERVICE,
    },
];

/// Look up a known app by short name (case-insensitive).
pub fn known_app(name: &str) -> Option<&'static KnownApp> {
    KNOWN_APPS
        .iter()
        .find(|app| app.name.eq_ignore_ascii_case(name.trim()))
}

/// A fully resolved service-token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub scope: String,
    pub app_package: String,
    pub app_sig: String,
}

impl ServiceRequest {
    /// Resolve a scope or known-app name into a request.
    ///
    /// A known name supplies its scope and package. An explicit package or
    /// signature wins over anything implied by the name. Missing values fall
    /// back to Play services and the first-party signature. An empty scope
    /// yields `None`.
    pub fn resolve(
        scope_or_name: &str,
        app_package: Option<&str>,
        app_sig: Option<&str>,
    ) -> Option<Self> {
        let scope_or_name = scope_or_name.trim();
        if scope_or_name.is_empty() {
            return None;
        }

        let known = known_app(scope_or_name);
        let scope = known.map_or(scope_or_name, |app| app.scope);
        fn explicit(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        let app_package = explicit(app_package)
            .or(known.map(|app| app.package))
            .unwrap_or(GMS_PACKAGE);
        let app_sig = explicit(app_sig).unwrap_or(GOOGLE_SIGNATURE);

        Some(Self {
            scope: scope.to_string(),
            app_package: app_package.to_string(),
            app_sig: app_sig.to_string(),
        })
    }
}

/// Kind of token returned by the exchange endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// First-party encrypted token (`aas_et/...`).
    Aes,
    /// Standard access token (`ya29....`).
    #[serde(rename = "oauth2")]
    OAuth2,
    Unknown,
}

impl TokenType {
    /// Classify a token by prefix. A bare prefix is not a token.
    pub fn classify(token: &str) -> Self {
        let has_body = |prefix: &str| token.strip_prefix(prefix).is_some_and(|rest| !rest.is_empty());
        if has_body("aas_et/") {
            TokenType::Aes
        } else if has_body("ya29.") {
            TokenType::OAuth2
        } else {
            TokenType::Unknown
        }
    }

    /// Short tag used in API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Aes => "aes",
            TokenType::OAuth2 => "oauth2",
            TokenType::Unknown => "unknown",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            TokenType::Aes => "AES (1P)",
            TokenType::OAuth2 => "OAuth2",
            TokenType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
