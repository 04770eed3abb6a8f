//! Device check-in.
//!
//! One round trip: build the request message from the device identity,
//! encode, gzip, POST, then pull the device id (field 7) and security token
//! (field 8) out of the schema-less decoded response.

use std::time::Duration;

use droidauth_config::DeviceConfig;
use droidauth_proto::{Message, Value, checkin_request_schema, decode, encode};
use rand::RngCore;
use reqwest::{Client, header};

use crate::compression::{gunzip, gzip, is_gzip_encoding};
use crate::error::{GoogleError, Result, snippet};

/// Check-in endpoint.
pub const CHECKIN_URL: &str = "https://android.clients.google.com/checkin";

/// User agent of the platform check-in service.
pub const CHECKIN_USER_AGENT: &str = "Android-Checkin/2.0 (vbox86p JLS36G); gzip";

/// Check-in protocol version.
const PROTOCOL_VERSION: i64 = 3;

/// OTA certificate reported by stock builds.
const OTA_CERT: &str = "71Q6Rn2DDZl1zPDVaaeEHItd";

/// Native ABIs the emulated device claims.
const NATIVE_PLATFORMS: &[&str] = &["arm64-v8a", "armeabi-v7a", "armeabi"];

/// Response field holding the device id.
const FIELD_ANDROID_ID: u32 = 7;

/// Response field holding the security token.
const FIELD_SECURITY_TOKEN: u32 = 8;

/// Configuration for the check-in client.
#[derive(Debug, Clone)]
pub struct CheckinConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub locale: String,
    pub time_zone: String,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            endpoint: CHECKIN_URL.to_string(),
            user_agent: CHECKIN_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            locale: "en_US".to_string(),
            time_zone: std::env::var("TZ")
                .ok()
                .filter(|tz| !tz.is_empty())
                .unwrap_or_else(|| "UTC".to_string()),
        }
    }
}

/// Result of a successful check-in. Both values are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckinResult {
    pub android_id: u64,
    pub security_token: u64,
}

/// Device registration client.
#[derive(Debug, Clone)]
pub struct CheckinClient {
    client: Client,
    config: CheckinConfig,
}

impl CheckinClient {
    pub fn new() -> Self {
        Self::with_config(CheckinConfig::default())
    }

    pub fn with_config(config: CheckinConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CheckinConfig {
        &self.config
    }

    /// Build the first-time check-in request for `device`.
    pub fn build_request(&self, device: &DeviceConfig) -> Message {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let logging_id = (rand::rng().next_u64() >> 1) as i64;

        let build = Message::new()
            .with(1, device.fingerprint.clone())
            .with(2, device.hardware.clone())
            .with(3, device.brand.clone())
            .with(5, device.bootloader.clone())
            .with(6, "android-google")
            .with(7, device.build_time)
            .with(9, device.device.clone())
            .with(10, device.sdk_version)
            .with(11, device.model.clone())
            .with(12, device.manufacturer.clone())
            .with(13, device.product.clone())
            .with(14, false);

        let startup_event = Message::new()
            .with(1, "event_log_start")
            .with(3, now_ms);

        let checkin = Message::new()
            .with(1, build)
            .with(2, 0i64)
            .with(3, vec![Value::from(startup_event)])
            .with(8, "WIFI::")
            .with(9, 0i64);

        let device_config = Message::new()
            .with(1, 3i64) // finger touch screen
            .with(2, 1i64) // no keys
            .with(3, 1i64) // no navigation
            .with(4, 2i64) // normal screen
            .with(5, false)
            .with(6, false)
            .with(7, 420i64)
            .with(8, 0x0003_0000i64) // GL ES 3.0
            .with(
                11,
                NATIVE_PLATFORMS
                    .iter()
                    .map(|abi| Value::from(*abi))
                    .collect::<Vec<_>>(),
            )
            .with(12, 1080i64)
            .with(13, 2400i64);

        Message::new()
            .with(2, 0i64) // no device id yet
            .with(4, checkin)
            .with(6, self.config.locale.clone())
            .with(7, logging_id)
            .with(11, vec![Value::from("")])
            .with(12, self.config.time_zone.clone())
            .with(14, PROTOCOL_VERSION)
            .with(15, vec![Value::from(OTA_CERT)])
            .with(18, device_config)
            .with(20, 0i64)
    }

    /// Register `device` and return its new identifiers.
    pub async fn checkin(&self, device: &DeviceConfig) -> Result<CheckinResult> {
        let message = self.build_request(device);
        let encoded =
            encode(&message, checkin_request_schema()).map_err(GoogleError::Encode)?;
        let body = gzip(&encoded).map_err(|e| GoogleError::Compression(e.to_string()))?;

        tracing::info!(
            endpoint = %self.config.endpoint,
            payload_len = encoded.len(),
            "Sending device check-in"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(header::CONTENT_TYPE, "application/x-protobuffer")
            .header(header::CONTENT_ENCODING, "gzip")
            .header(header::ACCEPT_ENCODING, "gzip")
            .header(header::USER_AGENT, &self.config.user_agent)
            .timeout(self.config.timeout)
            .body(body)
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

        if status != reqwest::StatusCode::OK {
            let text = String::from_utf8_lossy(&raw);
            return Err(GoogleError::RegistrationFailed {
                status: status.as_u16(),
                body: snippet(&text),
            });
        }

        let payload = if gzipped {
            gunzip(&raw).map_err(|e| GoogleError::Compression(e.to_string()))?
        } else {
            raw.to_vec()
        };

        let result = parse_checkin_response(&payload)?;
        tracing::info!(android_id = %format!("{:x}", result.android_id), "Check-in complete");
        Ok(result)
    }
}

impl Default for CheckinClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the identifiers from a decoded check-in response.
pub fn parse_checkin_response(payload: &[u8]) -> Result<CheckinResult> {
    let decoded = decode(payload).map_err(GoogleError::Decode)?;

    let read_u64 = |field: u32| {
        decoded
            .get(field)
            .and_then(Value::first)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };

    let android_id = read_u64(FIELD_ANDROID_ID);
    if android_id == 0 {
        return Err(GoogleError::MissingDeviceId);
    }

    Ok(CheckinResult {
        android_id,
        security_token: read_u64(FIELD_SECURITY_TOKEN),
    })
}
