//! Centralized Configuration Management
//!
//! All tunables of the runtime in one serde-friendly tree. Every section has a
//! `Default` matching production behaviour and `PushlinkConfig::testing()`
//! shrinks the delays for fast tests. Configuration can be loaded from TOML;
//! missing keys fall back to the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::ConfigError;

// ----------------------------------------------------------------------------
// Supervisor Configuration
// ----------------------------------------------------------------------------

/// Reconnect loop behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Fixed wait before every connect attempt, in milliseconds
    pub reconnect_delay_ms: u64,
    /// How long `shutdown` waits for tasks before aborting them, in milliseconds
    pub shutdown_timeout_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 3_000,
            shutdown_timeout_ms: 5_000,
        }
    }
}

impl SupervisorConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

// ----------------------------------------------------------------------------
// Receipt Retry Configuration
// ----------------------------------------------------------------------------

/// Bounded retry policy for receipt correlation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial lookup
    pub max_retries: u32,
    /// Delay between lookups, in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Total lookups including the initial one
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes for the runtime's channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Inbound events (Transport → Ingestion)
    pub inbound_buffer_size: usize,
    /// App events (Runtime → Subscribers); slow subscribers lag past this
    pub app_event_buffer_size: usize,
    /// Receipts waiting for the dedicated receipt worker
    pub receipt_queue_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            inbound_buffer_size: 128, // Reconnects can flush a backlog
            app_event_buffer_size: 64,
            receipt_queue_size: 64,
        }
    }
}

impl ChannelConfig {
    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            inbound_buffer_size: 16,
            app_event_buffer_size: 64,
            receipt_queue_size: 16,
        }
    }
}

// ----------------------------------------------------------------------------
// Dispatch Configuration
// ----------------------------------------------------------------------------

/// Where receipt correlation runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Correlate receipts on a separate worker instead of inline on the
    /// ingestion path, so a stalled lookup does not delay later messages
    pub dedicated_receipt_worker: bool,
}

// ----------------------------------------------------------------------------
// Top-level Configuration
// ----------------------------------------------------------------------------

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushlinkConfig {
    pub supervisor: SupervisorConfig,
    pub receipts: RetryConfig,
    pub channels: ChannelConfig,
    pub dispatch: DispatchConfig,
}

impl PushlinkConfig {
    /// Short delays and small buffers for tests
    pub fn testing() -> Self {
        Self {
            supervisor: SupervisorConfig {
                reconnect_delay_ms: 50,
                shutdown_timeout_ms: 1_000,
            },
            receipts: RetryConfig {
                max_retries: 3,
                retry_delay_ms: 10,
            },
            channels: ChannelConfig::testing(),
            dispatch: DispatchConfig::default(),
        }
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Loading configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that would hot-loop the supervisor or panic channel construction
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supervisor.reconnect_delay_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "supervisor.reconnect_delay_ms must be greater than zero".to_string(),
            });
        }
        let buffers = [
            ("channels.inbound_buffer_size", self.channels.inbound_buffer_size),
            ("channels.app_event_buffer_size", self.channels.app_event_buffer_size),
            ("channels.receipt_queue_size", self.channels.receipt_queue_size),
        ];
        for (name, size) in buffers {
            if size == 0 {
                return Err(ConfigError::Invalid {
                    reason: format!("{} must be greater than zero", name),
                });
            }
        }
        Ok(())
    }
}
