//! Inbound message logic
//!
//! - `normalizer`: raw chat message → `NormalizedMessage`
//! - `ingest`: normalize, persist through the store, publish notifications

pub mod ingest;
pub mod normalizer;

pub use ingest::{IngestionStats, IngestionStatsSnapshot, MessageIngestor};
pub use normalizer::{save_attachment, MessageNormalizer};
