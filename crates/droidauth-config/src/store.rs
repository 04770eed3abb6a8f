//! Shared, persisted state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::discovery::{load_config_from, save_config_to};
use crate::{Config, Result};

/// State shared across handlers and background tasks.
pub type SharedConfigStore = Arc<ConfigStore>;

/// A [`Config`] behind a lock, optionally backed by a file.
///
/// Updates are applied to a copy, written to disk, and only then made
/// visible. A failed save leaves both the file and the in-memory state as
/// they were.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: RwLock<Config>,
}

impl ConfigStore {
    /// Load the store from `path` (defaults if the file does not exist).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = load_config_from(&path)?;
        Ok(Self {
            path: Some(path),
            config: RwLock::new(config),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory(config: Config) -> Self {
        Self {
            path: None,
            config: RwLock::new(config),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Config {
        self.config.read().clone()
    }

    /// Apply `f`, persist, then publish the new state.
    pub fn update<R>(&self, f: impl FnOnce(&mut Config) -> R) -> Result<R> {
        let mut guard = self.config.write();
        let mut next = guard.clone();
        let out = f(&mut next);
        if let Some(path) = &self.path {
            save_config_to(&next, path)?;
        }
        *guard = next;
        Ok(out)
    }
}
