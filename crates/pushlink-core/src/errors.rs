//! Error types for Pushlink
//!
//! Each collaborator surface has its own error enum; `PushlinkError` unifies
//! them for the builder and handle APIs. None of these are fatal to the
//! supervisor: transport errors feed the retry loop, storage and attachment
//! errors are logged and the affected event is dropped.

use std::io;
use std::path::PathBuf;

use crate::types::Timestamp;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Failures reported by the transport collaborator
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },
    #[error("Protocol error: {reason}")]
    Protocol { reason: String },
    #[error("Network I/O error: {0}")]
    NetworkIo(#[from] io::Error),
    #[error("Connection closed by remote: {reason}")]
    Closed { reason: String },
    #[error("Transport has no inbound channel attached")]
    NotAttached,
}

/// Failures reported by the storage collaborator
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No sent message matches yet; the local write may still be in flight
    #[error("No sent message from {sender} at {timestamp}")]
    NotFound { sender: String, timestamp: Timestamp },
    #[error("Message rejected by storage: {reason}")]
    Rejected { reason: String },
    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    /// Whether this is the retryable "not written yet" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Failures while persisting attachment bytes locally
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Attachment directory is not configured")]
    MissingDirectory,
    #[error("Failed to write attachment to {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Failures while correlating a receipt with a stored message
#[derive(Debug, thiserror::Error)]
pub enum CorrelationError {
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: StorageError },
    #[error("Storage error during correlation: {0}")]
    Storage(StorageError),
}

impl CorrelationError {
    /// Number of storage lookups performed before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            CorrelationError::Exhausted { attempts, .. } => *attempts,
            CorrelationError::Storage(_) => 1,
        }
    }
}

/// Configuration loading and validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] io::Error),
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Unified error type for the Pushlink crates
#[derive(Debug, thiserror::Error)]
pub enum PushlinkError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Task join error: {reason}")]
    TaskJoin { reason: String },
}

pub type PushlinkResult<T> = Result<T, PushlinkError>;
