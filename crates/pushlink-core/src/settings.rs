//! Read-only settings lookups
//!
//! The runtime reads user settings through the `Settings` trait instead of a
//! process-wide store, so the message normalizer stays a function of its
//! inputs. `ClientSettings` is the plain value form; `SharedSettings` lets the
//! application flip a setting (e.g. incognito) while the runtime is running.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::errors::ConfigError;

pub const SAVE_ATTACHMENTS: &str = "save_attachments";
pub const INCOGNITO: &str = "incognito";
pub const ATTACHMENT_DIR: &str = "attachment_dir";

/// Key lookups consumed by the runtime
///
/// Unknown boolean keys read as `false`, unknown string keys as `None`.
pub trait Settings: Send + Sync {
    fn get_bool(&self, key: &str) -> bool;
    fn get_string(&self, key: &str) -> Option<String>;
}

// ----------------------------------------------------------------------------
// Client Settings
// ----------------------------------------------------------------------------

/// The settings the runtime reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub save_attachments: bool,
    pub incognito: bool,
    pub attachment_dir: Option<PathBuf>,
}

impl ClientSettings {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

impl Settings for ClientSettings {
    fn get_bool(&self, key: &str) -> bool {
        match key {
            SAVE_ATTACHMENTS => self.save_attachments,
            INCOGNITO => self.incognito,
            _ => false,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        match key {
            ATTACHMENT_DIR => self
                .attachment_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Shared Settings
// ----------------------------------------------------------------------------

/// Cloneable, updatable settings handle
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<ClientSettings>>,
}

impl SharedSettings {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Apply a change; readers see it on their next lookup
    pub fn update(&self, change: impl FnOnce(&mut ClientSettings)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        change(&mut guard);
    }

    pub fn snapshot(&self) -> ClientSettings {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Settings for SharedSettings {
    fn get_bool(&self, key: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get_bool(key)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get_string(key)
    }
}
