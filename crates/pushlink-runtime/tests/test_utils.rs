//! Test utilities for the Pushlink runtime
//!
//! Mock collaborators whose behaviour tests control directly: a transport
//! that listens until told to stop, an in-memory message store, and helpers
//! for waiting on app events under paused tokio time.

#![allow(dead_code)]

use async_trait::async_trait;
use pushlink_core::{
    AppEvent, AppEventReceiver, CorrelationResult, GroupContext, InboundEvent, InboundSender,
    MessageId, MessageStore, NormalizedMessage, SessionId, SessionSummary, StorageError,
    StoredMessage, Timestamp, TransportError, TransportSession,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};

// ----------------------------------------------------------------------------
// Mock Transport
// ----------------------------------------------------------------------------

/// Observable state shared between a `MockTransport` and the test
pub struct TransportControl {
    inbound: Mutex<Option<InboundSender>>,
    opens: watch::Sender<u32>,
    listens: watch::Sender<u32>,
    stops: AtomicU32,
    failing_opens: AtomicU32,
    drop_with_error: AtomicBool,
    ignore_stops: AtomicBool,
    listening: AtomicBool,
    stop: Notify,
}

impl TransportControl {
    fn new() -> Self {
        let (opens, _) = watch::channel(0);
        let (listens, _) = watch::channel(0);
        Self {
            inbound: Mutex::new(None),
            opens,
            listens,
            stops: AtomicU32::new(0),
            failing_opens: AtomicU32::new(0),
            drop_with_error: AtomicBool::new(false),
            ignore_stops: AtomicBool::new(false),
            listening: AtomicBool::new(false),
            stop: Notify::new(),
        }
    }

    pub fn opens(&self) -> u32 {
        *self.opens.borrow()
    }

    pub fn listens(&self) -> u32 {
        *self.listens.borrow()
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Make the next `count` calls to `open` fail
    pub fn fail_next_opens(&self, count: u32) {
        self.failing_opens.store(count, Ordering::SeqCst);
    }

    /// End the running listener with a transport error
    pub fn drop_connection(&self) {
        self.drop_with_error.store(true, Ordering::SeqCst);
        self.stop.notify_waiters();
    }

    /// Count `stop_listening` calls without ending the listener, like a
    /// transport that only notices the stop on its next event
    pub fn ignore_stops(&self) {
        self.ignore_stops.store(true, Ordering::SeqCst);
    }

    /// Wait until `start_listening` has been entered `count` times
    pub async fn wait_for_listens(&self, count: u32) {
        let mut listens = self.listens.subscribe();
        tokio::time::timeout(
            Duration::from_secs(60),
            listens.wait_for(|listens| *listens >= count),
        )
        .await
        .expect("transport never started listening")
        .expect("transport control dropped");
    }

    /// Sender the runtime attached, for injecting inbound events
    pub fn inbound(&self) -> InboundSender {
        self.inbound
            .lock()
            .unwrap()
            .clone()
            .expect("transport was never attached")
    }

    pub async fn deliver(&self, event: InboundEvent) {
        self.inbound().send(event).await.expect("inbound channel closed");
    }
}

/// Transport whose listener runs until `stop_listening` or `drop_connection`
pub struct MockTransport {
    control: Arc<TransportControl>,
}

impl MockTransport {
    pub fn new() -> (Self, Arc<TransportControl>) {
        let control = Arc::new(TransportControl::new());
        (
            Self {
                control: Arc::clone(&control),
            },
            control,
        )
    }
}

#[async_trait]
impl TransportSession for MockTransport {
    fn attach(&mut self, inbound: InboundSender) -> Result<(), TransportError> {
        *self.control.inbound.lock().unwrap() = Some(inbound);
        Ok(())
    }

    async fn open(&self) -> Result<(), TransportError> {
        self.control.opens.send_modify(|opens| *opens += 1);
        let failing = self.control.failing_opens.load(Ordering::SeqCst);
        if failing > 0 {
            self.control.failing_opens.store(failing - 1, Ordering::SeqCst);
            return Err(TransportError::ConnectionFailed {
                reason: "service unreachable".to_string(),
            });
        }
        Ok(())
    }

    async fn start_listening(&self) -> Result<(), TransportError> {
        let stopped = self.control.stop.notified();
        self.control.listening.store(true, Ordering::SeqCst);
        self.control.listens.send_modify(|listens| *listens += 1);

        stopped.await;

        self.control.listening.store(false, Ordering::SeqCst);
        if self.control.drop_with_error.swap(false, Ordering::SeqCst) {
            return Err(TransportError::Closed {
                reason: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    fn stop_listening(&self) {
        self.control.stops.fetch_add(1, Ordering::SeqCst);
        if !self.control.ignore_stops.load(Ordering::SeqCst) {
            self.control.stop.notify_waiters();
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ----------------------------------------------------------------------------
// In-Memory Message Store
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub session_id: SessionId,
    pub message_id: MessageId,
    pub message: NormalizedMessage,
    pub group: Option<GroupContext>,
    pub is_incoming: bool,
}

#[derive(Default)]
struct StoreState {
    sessions: HashMap<String, SessionId>,
    records: Vec<StoredRecord>,
}

/// Message store keeping sessions and records in memory
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    reject_next: AtomicBool,
    hidden_lookups: AtomicU32,
    lookups: AtomicU32,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reject the next `process_message` call
    pub fn reject_next(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    /// Report `NotFound` for the next `count` receipt lookups, as if the
    /// sent-message write had not landed yet
    pub fn hide_next_lookups(&self, count: u32) {
        self.hidden_lookups.store(count, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<StoredRecord> {
        self.state.lock().unwrap().records.clone()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn process_message(
        &self,
        message: NormalizedMessage,
        group: Option<&GroupContext>,
        is_incoming: bool,
    ) -> Result<StoredMessage, StorageError> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Rejected {
                reason: "rejected by test".to_string(),
            });
        }

        let mut state = self.state.lock().unwrap();
        let key = group
            .map(|group| group.id.clone())
            .unwrap_or_else(|| message.source.clone());
        let next_session = SessionId::new(state.sessions.len() as i64 + 1);
        let session_id = *state.sessions.entry(key).or_insert(next_session);
        let message_id = MessageId::new(state.records.len() as i64 + 1);

        let session = SessionSummary {
            id: session_id,
            source: message.source.clone(),
            preview: message.body.clone(),
            is_group: group.is_some(),
        };
        state.records.push(StoredRecord {
            session_id,
            message_id,
            message,
            group: group.cloned(),
            is_incoming,
        });

        Ok(StoredMessage {
            session,
            message_id,
        })
    }

    async fn mark_message_received(
        &self,
        source: &str,
        timestamp: Timestamp,
    ) -> Result<CorrelationResult, StorageError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let not_found = StorageError::NotFound {
            sender: source.to_string(),
            timestamp,
        };
        let hidden = self.hidden_lookups.load(Ordering::SeqCst);
        if hidden > 0 {
            self.hidden_lookups.store(hidden - 1, Ordering::SeqCst);
            return Err(not_found);
        }

        let state = self.state.lock().unwrap();
        state
            .records
            .iter()
            .find(|record| {
                record.message.sent
                    && record.message.source == source
                    && record.message.timestamp == timestamp
            })
            .map(|record| CorrelationResult::new(record.session_id, record.message_id))
            .ok_or(not_found)
    }
}

// ----------------------------------------------------------------------------
// Event Helpers
// ----------------------------------------------------------------------------

/// Next app event that is not a connectivity change
pub async fn next_message_event(events: &mut AppEventReceiver) -> AppEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("timed out waiting for app event")
            .expect("app event channel closed");
        if !matches!(event, AppEvent::ConnectivityChanged { .. }) {
            return event;
        }
    }
}

/// Wait for the `MessageReceived` + `NotifyMessage` pair of one stored message
pub async fn wait_for_stored_message(events: &mut AppEventReceiver) -> (AppEvent, AppEvent) {
    let received = next_message_event(events).await;
    assert!(
        matches!(received, AppEvent::MessageReceived { .. }),
        "expected MessageReceived, got {received:?}"
    );
    let notify = next_message_event(events).await;
    assert!(
        matches!(notify, AppEvent::NotifyMessage { .. }),
        "expected NotifyMessage, got {notify:?}"
    );
    (received, notify)
}

/// Drain everything currently buffered on `events`
pub fn drain(events: &mut AppEventReceiver) -> Vec<AppEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
