//! Durable config store
//!
//! Owns the in-memory document and its on-disk path. Reads hand out clones
//! (snapshots) so the ingest path never observes a half-applied mutation;
//! writes go through [`ConfigStore::mutate`], which applies a closure under
//! the lock and rewrites the whole file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{ConfigError, Result};
use crate::listeners::{DeviceConfig, ListenerConfig};
use crate::Config;

pub struct ConfigStore {
    path: PathBuf,
    config: Mutex<Config>,
}

impl ConfigStore {
    /// Load the document, creating it with defaults when absent.
    ///
    /// A file that exists but fails to parse is a fatal error - silently
    /// replacing an operator's config would lose their tables.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let config = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Config::default();
                write_document(&path, &config)?;
                config
            }
            Err(e) => return Err(ConfigError::io(path.display().to_string(), e)),
        };

        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    /// In-memory store seeded with a document (tests, embedding). Saves
    /// still write to the given path.
    pub fn with_config(path: impl AsRef<Path>, config: Config) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: Mutex::new(config),
        }
    }

    /// Snapshot of the whole document.
    pub fn snapshot(&self) -> Config {
        self.config.lock().clone()
    }

    /// Snapshot of the listener table.
    pub fn listeners(&self) -> Vec<ListenerConfig> {
        self.config.lock().listeners.clone()
    }

    /// Snapshot of the device table.
    pub fn devices(&self) -> Vec<DeviceConfig> {
        self.config.lock().devices.clone()
    }

    /// Snapshot of the severity override table.
    pub fn severity_overrides(&self) -> HashMap<String, u8> {
        self.config.lock().severity_overrides.clone()
    }

    /// Snapshot of the module enable flags.
    pub fn enabled_modules(&self) -> HashMap<String, bool> {
        self.config.lock().enabled_modules.clone()
    }

    /// Row cap for the log store (0 = unlimited).
    pub fn database_limit(&self) -> u64 {
        self.config.lock().database.limit
    }

    /// Apply a mutation under the lock and persist the document.
    ///
    /// The closure's return value passes through, so callers can extract
    /// the entity they touched.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Config) -> T) -> Result<T> {
        let mut guard = self.config.lock();
        let value = f(&mut guard);
        write_document(&self.path, &guard)?;
        Ok(value)
    }

    /// Persist the current document without changing it.
    pub fn save(&self) -> Result<()> {
        let guard = self.config.lock();
        write_document(&self.path, &guard)
    }
}

/// Full-document pretty-printed rewrite.
fn write_document(path: &Path, config: &Config) -> Result<()> {
    let data = serde_json::to_vec_pretty(config)?;
    fs::write(path, data).map_err(|e| ConfigError::io(path.display().to_string(), e))
}

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;
