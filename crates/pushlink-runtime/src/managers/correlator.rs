//! Receipt correlation for the Pushlink runtime
//!
//! A delivery receipt can arrive before the local write recording that the
//! matching message was sent has landed. `ReceiptCorrelator` absorbs that race
//! with a short bounded retry; a receipt that still cannot be matched is
//! logged and dropped, never queued for later.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pushlink_core::{
    AppEvent, AppEventSender, CorrelationError, CorrelationResult, MessageStore, NonBlockingSend,
    Receipt, RetryConfig, Timestamp,
};
use tracing::{debug, error};

// ----------------------------------------------------------------------------
// Receipt Correlator
// ----------------------------------------------------------------------------

/// Matches receipts to stored outbound messages
pub struct ReceiptCorrelator {
    store: Arc<dyn MessageStore>,
    retry: RetryConfig,
    app_events: AppEventSender,
    stats: Arc<CorrelatorStats>,
}

impl ReceiptCorrelator {
    pub fn new(store: Arc<dyn MessageStore>, retry: RetryConfig, app_events: AppEventSender) -> Self {
        Self {
            store,
            retry,
            app_events,
            stats: Arc::new(CorrelatorStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<CorrelatorStats> {
        Arc::clone(&self.stats)
    }

    /// Look up the sent message `(source, timestamp)`
    ///
    /// Only `StorageError::NotFound` is retried, up to `retry.max_retries`
    /// times with `retry.retry_delay()` between lookups. Any other storage
    /// error ends the correlation immediately.
    pub async fn correlate(
        &self,
        source: &str,
        timestamp: Timestamp,
    ) -> Result<CorrelationResult, CorrelationError> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.stats.lookups.fetch_add(1, Ordering::Relaxed);

            match self.store.mark_message_received(source, timestamp).await {
                Ok(result) => return Ok(result),
                Err(error) if error.is_not_found() => {
                    if attempt >= max_attempts {
                        return Err(CorrelationError::Exhausted {
                            attempts: attempt,
                            last: error,
                        });
                    }
                    debug!(
                        attempt,
                        %source,
                        %timestamp,
                        "Receipt handler can't find message, trying again later"
                    );
                    tokio::time::sleep(self.retry.retry_delay()).await;
                }
                Err(error) => return Err(CorrelationError::Storage(error)),
            }
        }
    }

    /// Correlate `receipt` and publish `MessageReceipt` on success
    pub async fn handle_receipt(&self, receipt: &Receipt) -> Option<CorrelationResult> {
        debug!(
            source = %receipt.source,
            timestamp = %receipt.timestamp,
            device_id = receipt.device_id,
            "Receipt handler"
        );

        match self.correlate(&receipt.source, receipt.timestamp).await {
            Ok(result) => {
                self.stats.applied.fetch_add(1, Ordering::Relaxed);
                let event = AppEvent::MessageReceipt {
                    session_id: result.session_id,
                    message_id: result.message_id,
                };
                if self.app_events.send_now(event).is_err() {
                    debug!("No subscribers for message receipt");
                }
                Some(result)
            }
            Err(error) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                error!(
                    %error,
                    attempts = error.attempts(),
                    source = %receipt.source,
                    timestamp = %receipt.timestamp,
                    "Failed to mark message received"
                );
                None
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Correlator Statistics
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CorrelatorStats {
    lookups: AtomicU64,
    applied: AtomicU64,
    dropped: AtomicU64,
}

impl CorrelatorStats {
    pub fn snapshot(&self) -> CorrelatorStatsSnapshot {
        CorrelatorStatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelatorStatsSnapshot {
    /// Storage lookups, retries included
    pub lookups: u64,
    /// Receipts applied to a stored message
    pub applied: u64,
    /// Receipts given up on
    pub dropped: u64,
}

impl CorrelatorStatsSnapshot {
    /// Average lookups per handled receipt
    pub fn average_lookups(&self) -> f64 {
        let handled = self.applied + self.dropped;
        if handled == 0 {
            0.0
        } else {
            self.lookups as f64 / handled as f64
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
