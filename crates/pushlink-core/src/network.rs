//! Network monitor interface
//!
//! The supervisor asks the monitor whether the device is online before every
//! connect attempt and subscribes to configuration-change events (Wi-Fi to
//! cellular handoffs and the like). `ManualNetworkMonitor` is a concrete
//! monitor that platform glue drives from its own connectivity callbacks.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

pub type NetworkEventReceiver = broadcast::Receiver<NetworkConfigEvent>;

/// State of a network configuration as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkConfigState {
    /// Configuration is up and carrying traffic
    Active,
    /// Configuration exists but is down
    Inactive,
    /// Configuration has been discovered but never activated
    Discovered,
    Undefined,
}

/// A network configuration changed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigEvent {
    /// Platform identifier of the configuration (e.g. "wlan0", "cellular")
    pub name: String,
    pub state: NetworkConfigState,
}

impl NetworkConfigEvent {
    pub fn new(name: impl Into<String>, state: NetworkConfigState) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == NetworkConfigState::Active
    }
}

/// Connectivity source consumed by the supervisor
///
/// Both methods are called from the runtime's tasks and must not block.
pub trait NetworkMonitor: Send + Sync {
    fn is_online(&self) -> bool;

    /// Subscribe to configuration-change events
    fn subscribe(&self) -> NetworkEventReceiver;
}

// ----------------------------------------------------------------------------
// Manual Network Monitor
// ----------------------------------------------------------------------------

/// Network monitor driven explicitly by the embedding application
#[derive(Debug)]
pub struct ManualNetworkMonitor {
    online: AtomicBool,
    events: broadcast::Sender<NetworkConfigEvent>,
}

impl ManualNetworkMonitor {
    pub fn new(online: bool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(online),
            events,
        }
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            debug!(online, "Network reachability changed");
        }
    }

    /// Publish a configuration change; returns the number of subscribers reached
    pub fn configuration_changed(&self, event: NetworkConfigEvent) -> usize {
        debug!(name = %event.name, state = ?event.state, "Network configuration changed");
        self.events.send(event).unwrap_or(0)
    }
}

impl Default for ManualNetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkMonitor for ManualNetworkMonitor {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> NetworkEventReceiver {
        self.events.subscribe()
    }
}
