//! State file discovery, loading and saving.

use std::path::{Path, PathBuf};

use crate::{Config, ConfigError, Result};

/// Application name, used for the config directory.
const APP_NAME: &str = "droidauth";

/// State file name inside the config directory.
const CONFIG_FILE: &str = "config.yaml";

/// Overrides the config directory.
pub const CONFIG_DIR_ENV: &str = "DROIDAUTH_CONFIG_DIR";

/// Overrides the full state file path.
pub const CONFIG_FILE_ENV: &str = "DROIDAUTH_CONFIG";

/// Config directory: `$DROIDAUTH_CONFIG_DIR`, else `<xdg config>/droidauth`.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Default state file path inside [`xdg_config_dir`].
pub fn default_config_path() -> Result<PathBuf> {
    xdg_config_dir()
        .map(|d| d.join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir(CONFIG_DIR_ENV))
}

/// Load state from `path`.
///
/// A missing file yields defaults. A file that exists but does not parse is
/// an error, so a typo never silently discards stored credentials.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;

    Config::from_yaml(&content)
}

/// Write state to `path`, creating parent directories.
///
/// On unix the file is readable by the owner only.
pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let write_err = |source| ConfigError::WriteFile {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let yaml = config.to_yaml()?;
    std::fs::write(path, yaml).map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(write_err)?;
    }

    tracing::debug!(path = %path.display(), "Config saved");
    Ok(())
}
