//! Message ingestion pipeline
//!
//! Normalizes an inbound chat message, hands it to the storage collaborator and
//! publishes the resulting notifications. A storage rejection drops the event;
//! the service redelivers messages it never saw acknowledged, so there is no
//! local retry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pushlink_core::{
    AppEvent, AppEventSender, ChatMessage, MessageStore, NonBlockingSend, StoredMessage, Timestamp,
};
use tracing::{debug, info, warn};

use super::normalizer::MessageNormalizer;

/// Normalize → persist → notify
pub struct MessageIngestor {
    normalizer: MessageNormalizer,
    store: Arc<dyn MessageStore>,
    app_events: AppEventSender,
    stats: Arc<IngestionStats>,
}

impl MessageIngestor {
    pub fn new(
        normalizer: MessageNormalizer,
        store: Arc<dyn MessageStore>,
        app_events: AppEventSender,
    ) -> Self {
        Self {
            normalizer,
            store,
            app_events,
            stats: Arc::new(IngestionStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<IngestionStats> {
        Arc::clone(&self.stats)
    }

    /// Ingest one chat message; returns the stored record on success
    pub async fn handle_message(
        &self,
        message: &ChatMessage,
        is_sync_sent: bool,
        sync_timestamp: Timestamp,
    ) -> Option<StoredMessage> {
        info!(
            source = %message.source,
            is_sync_sent,
            ts = %sync_timestamp,
            "Message received"
        );
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let normalized = self.normalizer.normalize(message, is_sync_sent, sync_timestamp);
        if normalized.attachment_saved {
            self.stats.attachments_saved.fetch_add(1, Ordering::Relaxed);
        }
        let is_incoming = !normalized.sent;

        let stored = match self
            .store
            .process_message(normalized, message.group.as_ref(), is_incoming)
            .await
        {
            Ok(stored) => stored,
            Err(error) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    %error,
                    source = %message.source,
                    is_sync_sent,
                    ts = %sync_timestamp,
                    "Failed to process incoming message"
                );
                return None;
            }
        };

        self.stats.stored.fetch_add(1, Ordering::Relaxed);
        self.publish(AppEvent::MessageReceived {
            session_id: stored.session.id,
            message_id: stored.message_id,
        });
        self.publish(AppEvent::NotifyMessage {
            session_id: stored.session.id,
            source: stored.session.source.clone(),
            preview: stored.session.preview.clone(),
            is_group: stored.session.is_group,
        });
        Some(stored)
    }

    fn publish(&self, event: AppEvent) {
        let kind = event.kind();
        if self.app_events.send_now(event).is_err() {
            debug!(kind, "No subscribers for app event");
        }
    }
}

// ----------------------------------------------------------------------------
// Ingestion Statistics
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct IngestionStats {
    received: AtomicU64,
    stored: AtomicU64,
    dropped: AtomicU64,
    attachments_saved: AtomicU64,
}

impl IngestionStats {
    pub fn snapshot(&self) -> IngestionStatsSnapshot {
        IngestionStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            attachments_saved: self.attachments_saved.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStatsSnapshot {
    pub received: u64,
    pub stored: u64,
    /// Messages storage rejected
    pub dropped: u64,
    pub attachments_saved: u64,
}
