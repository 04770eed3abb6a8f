//! State file types.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default port for the local API server.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Everything persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device id from check-in, lower-case hex.
    pub android_id: String,

    /// Security token from check-in, decimal.
    pub security_token: String,

    /// Account email from the master-token exchange.
    pub email: String,

    /// Long-lived master token.
    pub master_token: String,

    /// Emulated device identity.
    pub device: DeviceConfig,

    /// Port the local API server listens on.
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            android_id: String::new(),
            security_token: String::new(),
            email: String::new(),
            master_token: String::new(),
            device: DeviceConfig::default(),
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Config {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Device check-in has been done.
    pub fn has_registration(&self) -> bool {
        !self.android_id.is_empty() && !self.security_token.is_empty()
    }

    /// Login has been completed.
    pub fn has_master_token(&self) -> bool {
        !self.master_token.is_empty() && !self.email.is_empty()
    }

    /// Record a check-in result. A zero id is never stored.
    pub fn set_registration(&mut self, android_id: u64, security_token: u64) {
        if android_id == 0 {
            return;
        }
        self.android_id = format!("{android_id:x}");
        self.security_token = security_token.to_string();
    }

    /// Android WebView user agent presented to the login pages.
    pub fn user_agent(&self) -> String {
        format!(
            "Mozilla/5.0 (Linux; Android {}; {} Build/{}; wv) \
             AppleWebKit/537.36 (KHTML, like Gecko) Version/4.0 \
             Chrome/120.0.6099.230 Mobile Safari/537.36 MinuteMaid",
            self.device.sdk_version, self.device.model, self.device.build_id
        )
    }

    /// User agent for the token-exchange endpoint.
    pub fn auth_user_agent(&self) -> String {
        format!(
            "GoogleAuth/1.4 ({} {}); gzip",
            self.device.device, self.device.build_id
        )
    }
}

/// Emulated device identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub model: String,
    pub brand: String,
    pub manufacturer: String,
    pub device: String,
    pub product: String,
    pub hardware: String,
    pub fingerprint: String,
    pub bootloader: String,
    pub build_id: String,
    pub sdk_version: i32,
    /// Build timestamp, seconds since the epoch.
    pub build_time: i64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            model: "Pixel 7".to_string(),
            brand: "google".to_string(),
            manufacturer: "Google".to_string(),
            device: "panther".to_string(),
            product: "panther".to_string(),
            hardware: "tensor".to_string(),
            fingerprint: "google/panther/panther:13/TQ3A.230901.001/10750268:user/release-keys"
                .to_string(),
            bootloader: "slider-1.2-9971768".to_string(),
            build_id: "TQ3A.230901.001".to_string(),
            sdk_version: 33,
            build_time: 1_693_440_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.device.sdk_version, 33);
        assert!(!config.has_registration());
        assert!(!config.has_master_token());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = Config::from_yaml("email: a@b.com\ndevice:\n  model: Pixel 8\n").unwrap();
        assert_eq!(config.email, "a@b.com");
        assert_eq!(config.device.model, "Pixel 8");
        assert_eq!(config.device.brand, "google");
        assert_eq!(config.server_port, 8080);
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = Config::default();
        config.set_registration(0x3f1c_0b5e_9a7d_2c41, 42);
        let parsed = Config::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.android_id, "3f1c0b5e9a7d2c41");
        assert_eq!(parsed.security_token, "42");
    }

    #[test]
    fn test_zero_registration_ignored() {
        let mut config = Config::default();
        config.set_registration(0, 99);
        assert!(!config.has_registration());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            Config::from_yaml("server_port: [not a port"),
            Err(ConfigError::ParseYaml(_))
        ));
    }

    #[test]
    fn test_user_agents() {
        let config = Config::default();
        assert!(
            config
                .user_agent()
                .starts_with("Mozilla/5.0 (Linux; Android 33; Pixel 7 Build/TQ3A.230901.001; wv)")
        );
        assert!(config.user_agent().ends_with("MinuteMaid"));
        assert_eq!(
            config.auth_user_agent(),
            "GoogleAuth/1.4 (panther TQ3A.230901.001); gzip"
        );
    }
}
