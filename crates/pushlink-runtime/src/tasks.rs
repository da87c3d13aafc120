//! Long-running runtime tasks
//!
//! - `InboundEventTask`: drains the transport's inbound channel in arrival
//!   order, ingesting messages and dispatching receipts
//! - `ReceiptWorkerTask`: optional dedicated receipt correlation worker, so
//!   a receipt waiting on its retry budget does not hold up later messages
//!
//! Both tasks stop when the shared shutdown signal flips to `true` or when
//! their input channel closes.

use std::sync::Arc;

use pushlink_core::{
    InboundEvent, InboundReceiver, NonBlockingSend, PushlinkResult, Receipt,
    ReceiptQueueReceiver, ReceiptQueueSender,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::logic::MessageIngestor;
use crate::managers::ReceiptCorrelator;

// ----------------------------------------------------------------------------
// Receipt Dispatch
// ----------------------------------------------------------------------------

/// Where the inbound task sends receipts
///
/// Queueing never waits: when the worker's queue is full the receipt is
/// dropped, so the inbound task keeps ingesting messages.
#[derive(Clone)]
pub enum ReceiptDispatch {
    /// Correlate on the inbound task itself
    Inline(Arc<ReceiptCorrelator>),
    /// Hand off to a `ReceiptWorkerTask`
    Queue(ReceiptQueueSender),
}

impl ReceiptDispatch {
    async fn dispatch(&self, receipt: Receipt) {
        match self {
            ReceiptDispatch::Inline(correlator) => {
                correlator.handle_receipt(&receipt).await;
            }
            ReceiptDispatch::Queue(queue) => {
                let (source, timestamp) = (receipt.source.clone(), receipt.timestamp);
                if let Err(error) = queue.send_now(receipt) {
                    warn!(%error, %source, %timestamp, "Receipt not queued, dropping receipt");
                }
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Inbound Event Task
// ----------------------------------------------------------------------------

pub struct InboundEventTask {
    inbound: InboundReceiver,
    ingestor: Arc<MessageIngestor>,
    receipts: ReceiptDispatch,
    shutdown: watch::Receiver<bool>,
}

impl InboundEventTask {
    pub fn new(
        inbound: InboundReceiver,
        ingestor: Arc<MessageIngestor>,
        receipts: ReceiptDispatch,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            inbound,
            ingestor,
            receipts,
            shutdown,
        }
    }

    pub async fn run(mut self) -> PushlinkResult<()> {
        info!("Inbound event task starting");

        loop {
            tokio::select! {
                event = self.inbound.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            debug!("Inbound channel closed");
                            break;
                        }
                    }
                }
                _ = shutdown_signalled(&mut self.shutdown) => break,
            }
        }

        info!("Inbound event task stopped");
        Ok(())
    }

    async fn handle_event(&self, event: InboundEvent) {
        match event {
            InboundEvent::Message {
                message,
                is_sync_sent,
                sync_timestamp,
            } => {
                self.ingestor
                    .handle_message(&message, is_sync_sent, sync_timestamp)
                    .await;
            }
            InboundEvent::Receipt(receipt) => self.receipts.dispatch(receipt).await,
        }
    }
}

// ----------------------------------------------------------------------------
// Receipt Worker Task
// ----------------------------------------------------------------------------

pub struct ReceiptWorkerTask {
    queue: ReceiptQueueReceiver,
    correlator: Arc<ReceiptCorrelator>,
    shutdown: watch::Receiver<bool>,
}

impl ReceiptWorkerTask {
    pub fn new(
        queue: ReceiptQueueReceiver,
        correlator: Arc<ReceiptCorrelator>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            correlator,
            shutdown,
        }
    }

    pub async fn run(mut self) -> PushlinkResult<()> {
        info!("Receipt worker starting");

        loop {
            tokio::select! {
                receipt = self.queue.recv() => {
                    let Some(receipt) = receipt else { break };
                    self.correlator.handle_receipt(&receipt).await;
                }
                _ = shutdown_signalled(&mut self.shutdown) => break,
            }
        }

        info!("Receipt worker stopped");
        Ok(())
    }
}

/// Resolves once the shutdown flag is set or its sender is dropped
pub(crate) async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
