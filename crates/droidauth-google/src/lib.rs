//! Clients for the Android device-identity endpoints.
//!
//! # Components
//!
//! - [`checkin`]: device registration, yields a device id and security token
//! - [`auth`]: master-token exchange and service-token requests
//! - [`apps`]: known scope shortcuts and token classification
//! - [`compression`]: gzip helpers shared with the proxy

pub mod apps;
pub mod auth;
pub mod checkin;
pub mod compression;
pub mod error;

pub use apps::{KNOWN_APPS, KnownApp, ServiceRequest, TokenType, known_app};
pub use auth::{AuthClient, AuthConfig, AuthResponse};
pub use checkin::{CheckinClient, CheckinConfig, CheckinResult};
pub use error::{GoogleError, Result};
