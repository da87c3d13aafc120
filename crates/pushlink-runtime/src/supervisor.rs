//! Connection supervisor
//!
//! Owns the transport lifecycle. A single supervised task runs the loop
//!
//! ```text
//! Disconnected --(delay, online)--> Connecting --(open ok)--> Connected
//!      ^                                 |                        |
//!      +------------(open failed)--------+                        |
//!      +-------(listener returned or reconnect forced)------------+
//! ```
//!
//! and a companion task watches the network monitor, forcing a reconnect
//! whenever a network configuration becomes active. A forced reconnect stops
//! the listener and lets the next attempt start without waiting out the delay.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pushlink_core::{
    AppEventSender, ConnectionState, NetworkEventReceiver, NetworkMonitor, PushlinkError,
    PushlinkResult, SupervisorConfig, TransportSession,
};
use tokio::sync::{broadcast::error::RecvError, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::managers::{ConnectionStats, ConnectionStatsSnapshot, ConnectionTracker};
use crate::tasks::shutdown_signalled;

// ----------------------------------------------------------------------------
// Reconnect Control
// ----------------------------------------------------------------------------

/// Shared reconnect trigger between the loop, the network watcher and callers
pub struct SupervisorControl {
    transport: Arc<dyn TransportSession>,
    reconnect_pending: AtomicBool,
    wake: Notify,
    stats: Arc<ConnectionStats>,
}

impl SupervisorControl {
    fn new(transport: Arc<dyn TransportSession>, stats: Arc<ConnectionStats>) -> Self {
        Self {
            transport,
            reconnect_pending: AtomicBool::new(false),
            wake: Notify::new(),
            stats,
        }
    }

    /// Stop the listener and have the loop retry immediately
    ///
    /// Never blocks and performs no I/O besides `stop_listening`.
    pub fn request_reconnect(&self) {
        info!(transport = self.transport.name(), "Forcing reconnect of transport");
        self.stats.forced_reconnects.fetch_add(1, Ordering::Relaxed);
        self.reconnect_pending.store(true, Ordering::SeqCst);
        self.wake.notify_one();
        self.transport.stop_listening();
    }

    fn reconnect_requested(&self) -> bool {
        self.reconnect_pending.load(Ordering::SeqCst)
    }

    fn take_reconnect_request(&self) -> bool {
        self.reconnect_pending.swap(false, Ordering::SeqCst)
    }

    /// Resolves once a reconnect is pending
    ///
    /// `Notify` keeps a permit from requests that were already consumed, so
    /// the flag is re-checked after every wakeup.
    async fn reconnect_signalled(&self) {
        loop {
            let notified = self.wake.notified();
            if self.reconnect_requested() {
                return;
            }
            notified.await;
        }
    }
}

// ----------------------------------------------------------------------------
// Connection Supervisor
// ----------------------------------------------------------------------------

pub struct ConnectionSupervisor {
    config: SupervisorConfig,
    transport: Arc<dyn TransportSession>,
    network: Arc<dyn NetworkMonitor>,
    tracker: ConnectionTracker,
    control: Arc<SupervisorControl>,
}

impl ConnectionSupervisor {
    pub fn new(
        config: SupervisorConfig,
        transport: Arc<dyn TransportSession>,
        network: Arc<dyn NetworkMonitor>,
        app_events: AppEventSender,
    ) -> Self {
        let tracker = ConnectionTracker::new(app_events);
        let control = Arc::new(SupervisorControl::new(
            Arc::clone(&transport),
            tracker.stats(),
        ));
        Self {
            config,
            transport,
            network,
            tracker,
            control,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.tracker.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.tracker.watch()
    }

    /// Publish a connected/disconnected edge
    pub fn set_connected(&self, connected: bool) -> bool {
        self.tracker.set_connected(connected)
    }

    pub fn request_reconnect(&self) {
        self.control.request_reconnect();
    }

    /// Subscribe to the network monitor, then spawn the supervised loop
    pub fn start(self) -> SupervisorHandle {
        let network_events = self.network.subscribe();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let mut handle = SupervisorHandle {
            state: self.tracker.watch(),
            stats: self.tracker.stats(),
            control: Arc::clone(&self.control),
            shutdown,
            tasks: Vec::new(),
            shutdown_timeout: self.config.shutdown_timeout(),
        };

        let watcher = tokio::spawn(watch_network(
            network_events,
            Arc::clone(&self.control),
            shutdown_rx.clone(),
        ));
        handle.track("network-watcher", watcher);
        handle.track("supervisor", tokio::spawn(self.run(shutdown_rx)));
        handle
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) -> PushlinkResult<()> {
        info!(
            transport = self.transport.name(),
            delay_ms = self.config.reconnect_delay_ms,
            "Connection supervisor starting"
        );

        loop {
            if !self.wait_before_attempt(&mut shutdown).await {
                break;
            }

            if !self.network.is_online() {
                self.tracker
                    .stats()
                    .offline_skips
                    .fetch_add(1, Ordering::Relaxed);
                debug!("No network connection found");
                continue;
            }

            if !self.connect_and_listen(&mut shutdown).await {
                break;
            }
        }

        self.tracker.set_connected(false);
        info!("Connection supervisor stopped");
        Ok(())
    }

    /// Wait out the reconnect delay unless a reconnect is pending
    ///
    /// Returns false on shutdown.
    async fn wait_before_attempt(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        if self.control.take_reconnect_request() {
            debug!("Reconnect pending, skipping delay");
            return true;
        }

        let deadline = Instant::now() + self.config.reconnect_delay();
        let proceed = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => true,
            _ = self.control.reconnect_signalled() => {
                debug!("Reconnect requested, delay superseded");
                true
            }
            _ = shutdown_signalled(shutdown) => false,
        };

        // This attempt satisfies any request that raced the delay.
        self.control.take_reconnect_request();
        proceed
    }

    /// One connection cycle; returns false on shutdown
    async fn connect_and_listen(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        let stats = self.tracker.stats();
        stats.connect_attempts.fetch_add(1, Ordering::Relaxed);
        self.tracker.set_state(ConnectionState::Connecting);

        let opened = tokio::select! {
            result = self.transport.open() => result,
            _ = shutdown_signalled(shutdown) => return false,
        };
        if let Err(error) = opened {
            stats.transport_failures.fetch_add(1, Ordering::Relaxed);
            warn!(%error, transport = self.transport.name(), "Failed to open transport");
            self.tracker.set_connected(false);
            return true;
        }

        self.tracker.set_connected(true);

        if self.control.reconnect_requested() {
            debug!("Reconnect requested while connecting");
            self.tracker.set_connected(false);
            return true;
        }

        debug!(transport = self.transport.name(), "Starting transport listener");
        let result = tokio::select! {
            result = self.transport.start_listening() => result,
            _ = self.control.reconnect_signalled() => {
                debug!("Reconnect requested while listening");
                self.transport.stop_listening();
                Ok(())
            }
            _ = shutdown_signalled(shutdown) => {
                self.transport.stop_listening();
                return false;
            }
        };

        match result {
            Ok(()) => info!(transport = self.transport.name(), "Transport listener returned"),
            Err(error) => {
                stats.transport_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    %error,
                    transport = self.transport.name(),
                    "Error processing transport events"
                );
            }
        }

        self.tracker.set_connected(false);
        true
    }
}

/// Forward network configuration changes as reconnect requests
async fn watch_network(
    mut events: NetworkEventReceiver,
    control: Arc<SupervisorControl>,
    mut shutdown: watch::Receiver<bool>,
) -> PushlinkResult<()> {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) if event.is_active() => {
                    info!(name = %event.name, "Network configuration became active");
                    control.request_reconnect();
                }
                Ok(event) => {
                    debug!(name = %event.name, state = ?event.state, "Ignoring network configuration change");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed network configuration changes");
                    control.request_reconnect();
                }
                Err(RecvError::Closed) => {
                    debug!("Network monitor closed");
                    break;
                }
            },
            _ = shutdown_signalled(&mut shutdown) => break,
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Supervisor Handle
// ----------------------------------------------------------------------------

/// Handle to the running supervisor and any tasks spawned alongside it
///
/// Dropping the handle closes the shutdown signal, which stops every tracked
/// task without waiting for it.
pub struct SupervisorHandle {
    state: watch::Receiver<ConnectionState>,
    stats: Arc<ConnectionStats>,
    control: Arc<SupervisorControl>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<(&'static str, JoinHandle<PushlinkResult<()>>)>,
    shutdown_timeout: Duration,
}

impl SupervisorHandle {
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn stats(&self) -> ConnectionStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn request_reconnect(&self) {
        self.control.request_reconnect();
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|(_, task)| !task.is_finished())
    }

    /// Receiver for additional tasks that should stop with the supervisor
    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    pub(crate) fn track(&mut self, name: &'static str, task: JoinHandle<PushlinkResult<()>>) {
        self.tasks.push((name, task));
    }

    /// Signal shutdown and wait for every task, aborting stragglers
    ///
    /// Returns the first task error encountered; every task is still waited
    /// for or aborted.
    pub async fn shutdown(&mut self) -> PushlinkResult<()> {
        info!("Supervisor shutdown requested");
        self.shutdown.send_replace(true);

        let mut first_error = None;
        for (name, mut task) in self.tasks.drain(..) {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(Ok(()))) => debug!(task = name, "Task stopped"),
                Ok(Ok(Err(error))) => {
                    warn!(task = name, %error, "Task stopped with error");
                    first_error.get_or_insert(error);
                }
                Ok(Err(join_error)) => {
                    warn!(task = name, error = %join_error, "Task failed to join");
                    first_error.get_or_insert(PushlinkError::TaskJoin {
                        reason: format!("{name}: {join_error}"),
                    });
                }
                Err(_) => {
                    warn!(task = name, "Task did not stop in time, aborting");
                    task.abort();
                }
            }
        }

        info!("Supervisor shutdown complete");
        first_error.map_or(Ok(()), Err)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
