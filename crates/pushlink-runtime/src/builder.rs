//! Runtime Builder API
//!
//! Wires a transport, a message store, a network monitor and client settings
//! into a running supervisor plus its ingestion tasks, and hands back a
//! `RuntimeHandle` for the UI layer.

use std::sync::Arc;
use std::time::Duration;

use pushlink_core::{
    create_app_event_channel, create_inbound_channel, create_receipt_queue, AppEventReceiver,
    AppEventSender, ClientSettings, ConnectionState, MessageStore, NetworkMonitor, PushlinkConfig,
    PushlinkResult, Settings, TransportSession,
};
use tokio::sync::watch;
use tracing::info;

use crate::logic::{IngestionStats, IngestionStatsSnapshot, MessageIngestor, MessageNormalizer};
use crate::managers::{
    ConnectionStatsSnapshot, CorrelatorStats, CorrelatorStatsSnapshot, ReceiptCorrelator,
};
use crate::supervisor::{ConnectionSupervisor, SupervisorHandle};
use crate::tasks::{InboundEventTask, ReceiptDispatch, ReceiptWorkerTask};

// ----------------------------------------------------------------------------
// Runtime Builder
// ----------------------------------------------------------------------------

pub struct RuntimeBuilder {
    config: PushlinkConfig,
    settings: Arc<dyn Settings>,
    transport: Box<dyn TransportSession>,
    store: Arc<dyn MessageStore>,
    network: Arc<dyn NetworkMonitor>,
}

impl RuntimeBuilder {
    pub fn new(
        transport: impl TransportSession + 'static,
        store: Arc<dyn MessageStore>,
        network: Arc<dyn NetworkMonitor>,
    ) -> Self {
        Self {
            config: PushlinkConfig::default(),
            settings: Arc::new(ClientSettings::default()),
            transport: Box::new(transport),
            store,
            network,
        }
    }

    pub fn with_config(mut self, config: PushlinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Settings consulted by the normalizer on every message
    pub fn with_settings(mut self, settings: Arc<dyn Settings>) -> Self {
        self.settings = settings;
        self
    }

    /// Run receipt correlation on its own worker task
    pub fn dedicated_receipt_worker(mut self, enabled: bool) -> Self {
        self.config.dispatch.dedicated_receipt_worker = enabled;
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.supervisor.reconnect_delay_ms = saturating_millis(delay);
        self
    }

    pub fn receipt_retry(mut self, max_retries: u32, delay: Duration) -> Self {
        self.config.receipts.max_retries = max_retries;
        self.config.receipts.retry_delay_ms = saturating_millis(delay);
        self
    }

    /// Attach the transport and start every runtime task
    pub async fn build_and_start(self) -> PushlinkResult<RuntimeHandle> {
        let Self {
            config,
            settings,
            mut transport,
            store,
            network,
        } = self;
        config.validate()?;

        info!(
            transport = transport.name(),
            dedicated_receipt_worker = config.dispatch.dedicated_receipt_worker,
            "Starting Pushlink runtime"
        );

        let (inbound_tx, inbound_rx) = create_inbound_channel(&config.channels);
        let (app_events, app_event_rx) = create_app_event_channel(&config.channels);

        transport.attach(inbound_tx)?;
        let transport: Arc<dyn TransportSession> = Arc::from(transport);

        let correlator = Arc::new(ReceiptCorrelator::new(
            Arc::clone(&store),
            config.receipts.clone(),
            app_events.clone(),
        ));
        let ingestor = Arc::new(MessageIngestor::new(
            MessageNormalizer::new(settings),
            store,
            app_events.clone(),
        ));
        let ingestion_stats = ingestor.stats();
        let correlator_stats = correlator.stats();

        let mut supervisor = ConnectionSupervisor::new(
            config.supervisor.clone(),
            transport,
            network,
            app_events.clone(),
        )
        .start();

        let receipts = if config.dispatch.dedicated_receipt_worker {
            let (queue_tx, queue_rx) = create_receipt_queue(&config.channels);
            let worker = ReceiptWorkerTask::new(
                queue_rx,
                Arc::clone(&correlator),
                supervisor.shutdown_signal(),
            );
            supervisor.track("receipt-worker", tokio::spawn(worker.run()));
            ReceiptDispatch::Queue(queue_tx)
        } else {
            ReceiptDispatch::Inline(correlator)
        };

        let inbound = InboundEventTask::new(
            inbound_rx,
            ingestor,
            receipts,
            supervisor.shutdown_signal(),
        );
        supervisor.track("inbound-events", tokio::spawn(inbound.run()));

        Ok(RuntimeHandle {
            supervisor,
            app_events,
            app_event_receiver: Some(app_event_rx),
            ingestion_stats,
            correlator_stats,
        })
    }
}

// ----------------------------------------------------------------------------
// Runtime Handle
// ----------------------------------------------------------------------------

/// Handle for interacting with a running runtime
pub struct RuntimeHandle {
    supervisor: SupervisorHandle,
    app_events: AppEventSender,
    app_event_receiver: Option<AppEventReceiver>,
    ingestion_stats: Arc<IngestionStats>,
    correlator_stats: Arc<CorrelatorStats>,
}

impl RuntimeHandle {
    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.supervisor.watch_state()
    }

    /// Receiver created before any task started; sees every event
    pub fn take_app_event_receiver(&mut self) -> Option<AppEventReceiver> {
        self.app_event_receiver.take()
    }

    /// New receiver seeing events published from now on
    pub fn subscribe(&self) -> AppEventReceiver {
        self.app_events.subscribe()
    }

    pub fn request_reconnect(&self) {
        self.supervisor.request_reconnect();
    }

    pub fn connection_stats(&self) -> ConnectionStatsSnapshot {
        self.supervisor.stats()
    }

    pub fn ingestion_stats(&self) -> IngestionStatsSnapshot {
        self.ingestion_stats.snapshot()
    }

    pub fn correlator_stats(&self) -> CorrelatorStatsSnapshot {
        self.correlator_stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    /// Stop the supervisor, the transport and the ingestion tasks
    pub async fn shutdown(&mut self) -> PushlinkResult<()> {
        self.supervisor.shutdown().await
    }
}

/// Whole milliseconds in `delay`, clamped to `u64::MAX`
fn saturating_millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
