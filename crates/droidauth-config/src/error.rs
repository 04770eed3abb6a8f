//! Configuration error types.

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or saving state.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the state file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to write the state file.
    #[error("failed to write config file '{path}': {source}")]
    WriteFile {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse or serialize YAML.
    #[error("failed to parse YAML config: {0}")]
    ParseYaml(String),

    /// No config directory could be determined.
    #[error("could not determine a config directory; set {0}")]
    NoConfigDir(&'static str),
}
