//! Pushlink Runtime Engine
//!
//! Keeps a client connected to its push messaging service and turns what the
//! service delivers into stored messages and UI notifications:
//! - `ConnectionSupervisor`: reconnect loop owning the transport lifecycle
//! - `MessageNormalizer` / `MessageIngestor`: inbound message pipeline
//! - `ReceiptCorrelator`: matches delivery receipts to sent messages
//! - `RuntimeBuilder`: wires everything together behind a `RuntimeHandle`
//!
//! `pushlink-core` provides the collaborator traits and data model.

pub mod builder;
pub mod logic;
pub mod managers;
pub mod supervisor;
pub mod tasks;

pub use builder::{RuntimeBuilder, RuntimeHandle};
pub use logic::{
    save_attachment, IngestionStats, IngestionStatsSnapshot, MessageIngestor, MessageNormalizer,
};
pub use managers::{
    ConnectionStats, ConnectionStatsSnapshot, ConnectionTracker, CorrelatorStats,
    CorrelatorStatsSnapshot, ReceiptCorrelator,
};
pub use supervisor::{ConnectionSupervisor, SupervisorControl, SupervisorHandle};
pub use tasks::{InboundEventTask, ReceiptDispatch, ReceiptWorkerTask};

// Re-export core types for convenience
pub use pushlink_core::{
    AppEvent, AppEventReceiver, AppEventSender, ChatMessage, ClientSettings, ConnectionState,
    InboundEvent, InboundSender, MessageStore, NetworkMonitor, PushlinkConfig, PushlinkError,
    PushlinkResult, Receipt, Settings, SharedSettings, TransportSession,
};

/// Install a `tracing-subscriber` fmt subscriber
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "logging")]
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
