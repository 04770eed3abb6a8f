//! Persistent state for droidauth.
//!
//! One YAML file holds everything the tool remembers between runs:
//!
//! ```yaml
//! android_id: 3f1c0b5e9a7d2c41
//! security_token: '1234567890123456789'
//! email: someone@gmail.com
//! master_token: aas_et/...
//! server_port: 8080
//! device:
//!   model: Pixel 7
//!   brand: google
//!   sdk_version: 33
//!   ...
//! ```
//!
//! [`ConfigStore`] shares it between the CLI, the API server and background
//! tasks.

pub mod discovery;
pub mod error;
pub mod store;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, CONFIG_FILE_ENV, default_config_path, load_config_from, save_config_to,
    xdg_config_dir,
};
pub use error::{ConfigError, Result};
pub use store::{ConfigStore, SharedConfigStore};
pub use types::{Config, DEFAULT_SERVER_PORT, DeviceConfig};
