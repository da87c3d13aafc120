//! Application-facing notifications
//!
//! The runtime never talks to a presentation layer directly. Everything a UI
//! or notifier needs to know is published as an `AppEvent` on a broadcast
//! channel that any number of subscribers can follow.

use serde::{Deserialize, Serialize};

use crate::types::{ConnectionState, MessageId, SessionId};

// ----------------------------------------------------------------------------
// AppEvent: Runtime → UI / Notifiers
// ----------------------------------------------------------------------------

/// Notifications emitted by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppEvent {
    /// The supervised connection changed state
    ConnectivityChanged {
        connected: bool,
        state: ConnectionState,
    },
    /// An inbound message was normalized and stored
    MessageReceived {
        session_id: SessionId,
        message_id: MessageId,
    },
    /// A delivery receipt was applied to a stored outbound message
    MessageReceipt {
        session_id: SessionId,
        message_id: MessageId,
    },
    /// User-facing notification for a newly stored message
    NotifyMessage {
        session_id: SessionId,
        source: String,
        preview: String,
        is_group: bool,
    },
}

impl AppEvent {
    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            AppEvent::ConnectivityChanged { .. } => "connectivity-changed",
            AppEvent::MessageReceived { .. } => "message-received",
            AppEvent::MessageReceipt { .. } => "message-receipt",
            AppEvent::NotifyMessage { .. } => "notify-message",
        }
    }
}
