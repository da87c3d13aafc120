//! Stateful managers owned by the runtime

pub mod connection;
pub mod correlator;

pub use connection::{ConnectionStats, ConnectionStatsSnapshot, ConnectionTracker};
pub use correlator::{CorrelatorStats, CorrelatorStatsSnapshot, ReceiptCorrelator};
