//! Channel Utilities
//!
//! Typed aliases over tokio channels plus constructors that take their
//! capacities from `ChannelConfig`:
//! - inbound events: bounded mpsc, transport → ingestion task
//! - app events: broadcast, runtime → any number of subscribers
//! - receipt queue: bounded mpsc, ingestion task → dedicated receipt worker

use tokio::sync::{broadcast, mpsc};

use crate::channel::communication::AppEvent;
use crate::config::ChannelConfig;
use crate::message::{InboundEvent, Receipt};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel buffer is full")]
    ChannelFull,
    #[error("Channel is closed")]
    ChannelClosed,
    #[error("Channel receiver was dropped")]
    ReceiverDropped,
}

pub type InboundSender = mpsc::Sender<InboundEvent>;
pub type InboundReceiver = mpsc::Receiver<InboundEvent>;
pub type AppEventSender = broadcast::Sender<AppEvent>;
pub type AppEventReceiver = broadcast::Receiver<AppEvent>;
pub type ReceiptQueueSender = mpsc::Sender<Receipt>;
pub type ReceiptQueueReceiver = mpsc::Receiver<Receipt>;

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create bounded inbound event channel (Transport → Ingestion)
pub fn create_inbound_channel(config: &ChannelConfig) -> (InboundSender, InboundReceiver) {
    mpsc::channel(config.inbound_buffer_size)
}

/// Create broadcast app event channel (Runtime → Subscribers)
///
/// Additional receivers are created with `sender.subscribe()`.
pub fn create_app_event_channel(config: &ChannelConfig) -> (AppEventSender, AppEventReceiver) {
    broadcast::channel(config.app_event_buffer_size)
}

/// Create bounded queue feeding the dedicated receipt worker
pub fn create_receipt_queue(config: &ChannelConfig) -> (ReceiptQueueSender, ReceiptQueueReceiver) {
    mpsc::channel(config.receipt_queue_size)
}

// ----------------------------------------------------------------------------
// Non-blocking Send
// ----------------------------------------------------------------------------

/// Send without awaiting, mapping tokio errors onto `ChannelError`
pub trait NonBlockingSend<T> {
    fn send_now(&self, item: T) -> Result<(), ChannelError>;
}

impl<T> NonBlockingSend<T> for mpsc::Sender<T> {
    fn send_now(&self, item: T) -> Result<(), ChannelError> {
        self.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        })
    }
}

impl<T> NonBlockingSend<T> for broadcast::Sender<T> {
    fn send_now(&self, item: T) -> Result<(), ChannelError> {
        self.send(item)
            .map(|_| ())
            .map_err(|_| ChannelError::ReceiverDropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ChatMessage;
    use crate::types::{MessageId, SessionId, Timestamp};

    #[tokio::test]
    async fn test_inbound_channel_capacity() {
        let config = ChannelConfig {
            inbound_buffer_size: 1,
            ..ChannelConfig::default()
        };
        let (sender, mut receiver) = create_inbound_channel(&config);
        let event = InboundEvent::incoming(ChatMessage::new("alice", "hi", Timestamp::new(1)));

        sender.send_now(event.clone()).unwrap();
        assert_eq!(sender.send_now(event.clone()), Err(ChannelError::ChannelFull));

        assert_eq!(receiver.recv().await, Some(event.clone()));
        drop(receiver);
        assert_eq!(sender.send_now(event), Err(ChannelError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_app_events_reach_every_subscriber() {
        let (sender, mut first) = create_app_event_channel(&ChannelConfig::default());
        let mut second = sender.subscribe();
        let event = AppEvent::MessageReceipt {
            session_id: SessionId::new(1),
            message_id: MessageId::new(2),
        };

        sender.send_now(event.clone()).unwrap();

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_broadcast_without_subscribers_reports_dropped_receiver() {
        let (sender, receiver) = create_app_event_channel(&ChannelConfig::default());
        drop(receiver);
        let result = sender.send_now(AppEvent::ConnectivityChanged {
            connected: false,
            state: crate::types::ConnectionState::Disconnected,
        });
        assert_eq!(result, Err(ChannelError::ReceiverDropped));
    }
}
