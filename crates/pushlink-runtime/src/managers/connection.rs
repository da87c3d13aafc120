//! Connection state management for the Pushlink runtime
//!
//! `ConnectionTracker` holds the single `ConnectionState` of a supervisor. It
//! is owned by the supervisor loop, which makes it the only writer; readers
//! follow the state through a `watch` channel and through the
//! `ConnectivityChanged` app events emitted on every transition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pushlink_core::{AppEvent, AppEventSender, ConnectionState, NonBlockingSend};
use tokio::sync::watch;
use tracing::{debug, info};

// ----------------------------------------------------------------------------
// Connection Tracker
// ----------------------------------------------------------------------------

/// Publishes the supervisor's connection state
#[derive(Debug)]
pub struct ConnectionTracker {
    state: watch::Sender<ConnectionState>,
    app_events: AppEventSender,
    stats: Arc<ConnectionStats>,
}

impl ConnectionTracker {
    pub fn new(app_events: AppEventSender) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state,
            app_events,
            stats: Arc::new(ConnectionStats::default()),
        }
    }

    /// Current state
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Follow state transitions
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Shared statistics, also updated by the reconnect path
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }

    /// Move to `next`, notifying subscribers if the state actually changed
    ///
    /// Returns whether a transition happened.
    pub fn set_state(&self, next: ConnectionState) -> bool {
        let previous = self.state.send_replace(next);
        if previous == next {
            return false;
        }

        self.stats.transitions.fetch_add(1, Ordering::Relaxed);
        if next.is_connected() {
            self.stats.connections.fetch_add(1, Ordering::Relaxed);
            info!("Connected to push service");
        } else {
            debug!(from = %previous, to = %next, "Connection state changed");
        }

        let event = AppEvent::ConnectivityChanged {
            connected: next.is_connected(),
            state: next,
        };
        if self.app_events.send_now(event).is_err() {
            debug!("No subscribers for connectivity change");
        }
        true
    }

    /// Shorthand for the connected/disconnected edges of the state machine
    pub fn set_connected(&self, connected: bool) -> bool {
        if connected {
            self.set_state(ConnectionState::Connected)
        } else {
            self.set_state(ConnectionState::Disconnected)
        }
    }
}

// ----------------------------------------------------------------------------
// Supporting Types
// ----------------------------------------------------------------------------

/// Counters for the reconnect loop
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub(crate) transitions: AtomicU64,
    pub(crate) connect_attempts: AtomicU64,
    pub(crate) connections: AtomicU64,
    pub(crate) transport_failures: AtomicU64,
    pub(crate) forced_reconnects: AtomicU64,
    pub(crate) offline_skips: AtomicU64,
}

impl ConnectionStats {
    pub fn snapshot(&self) -> ConnectionStatsSnapshot {
        ConnectionStatsSnapshot {
            transitions: self.transitions.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connections: self.connections.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            forced_reconnects: self.forced_reconnects.load(Ordering::Relaxed),
            offline_skips: self.offline_skips.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `ConnectionStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStatsSnapshot {
    /// State transitions published
    pub transitions: u64,
    /// Times the transport was asked to open
    pub connect_attempts: u64,
    /// Times the connection reached `Connected`
    pub connections: u64,
    /// Open or listen failures
    pub transport_failures: u64,
    /// Reconnects forced by network changes or callers
    pub forced_reconnects: u64,
    /// Attempts skipped because the network was offline
    pub offline_skips: u64,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
