//! Inbound event and message record types
//!
//! `InboundEvent` is what a transport hands to the runtime for every protocol
//! callback. `NormalizedMessage` is the canonical record the runtime produces
//! from a chat message and hands to the storage collaborator.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{MessageId, SessionId, Timestamp};

pub const MEMBER_JOINED_NOTICE: &str = "Member joined group";
pub const MEMBER_LEFT_NOTICE: &str = "Member left group";

// ----------------------------------------------------------------------------
// Inbound Events
// ----------------------------------------------------------------------------

/// Attachment descriptor carried on an inbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// What a group context on a message represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupAction {
    /// Ordinary message delivered to the group
    Deliver,
    /// Group update: a member joined
    Join,
    /// A member left the group
    Leave,
}

/// Group context attached to a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupContext {
    pub id: String,
    pub name: Option<String>,
    pub members: Vec<String>,
    pub action: GroupAction,
}

impl GroupContext {
    pub fn new(id: impl Into<String>, action: GroupAction) -> Self {
        Self {
            id: id.into(),
            name: None,
            members: Vec::new(),
            action,
        }
    }

    /// Fixed body text for membership-change events, `None` for ordinary delivery
    pub fn membership_notice(&self) -> Option<&'static str> {
        match self.action {
            GroupAction::Join => Some(MEMBER_JOINED_NOTICE),
            GroupAction::Leave => Some(MEMBER_LEFT_NOTICE),
            GroupAction::Deliver => None,
        }
    }
}

/// A chat message as decoded by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub source: String,
    pub body: String,
    pub flags: u32,
    pub timestamp: Timestamp,
    pub attachments: Vec<Attachment>,
    pub group: Option<GroupContext>,
}

impl ChatMessage {
    pub fn new(source: impl Into<String>, body: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            source: source.into(),
            body: body.into(),
            flags: 0,
            timestamp,
            attachments: Vec::new(),
            group: None,
        }
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_group(mut self, group: GroupContext) -> Self {
        self.group = Some(group);
        self
    }
}

/// Delivery receipt from a peer for a message we sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub source: String,
    pub device_id: u32,
    pub timestamp: Timestamp,
}

impl Receipt {
    pub fn new(source: impl Into<String>, device_id: u32, timestamp: Timestamp) -> Self {
        Self {
            source: source.into(),
            device_id,
            timestamp,
        }
    }
}

/// Events delivered by a transport for each protocol callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundEvent {
    /// A chat message; sync-sent messages are ones we sent from another device
    Message {
        message: ChatMessage,
        is_sync_sent: bool,
        sync_timestamp: Timestamp,
    },
    /// A delivery receipt
    Receipt(Receipt),
}

impl InboundEvent {
    /// Incoming message from a peer
    pub fn incoming(message: ChatMessage) -> Self {
        InboundEvent::Message {
            message,
            is_sync_sent: false,
            sync_timestamp: Timestamp::ZERO,
        }
    }

    /// Message echoed back from one of our other devices
    pub fn sync_sent(message: ChatMessage, sync_timestamp: Timestamp) -> Self {
        InboundEvent::Message {
            message,
            is_sync_sent: true,
            sync_timestamp,
        }
    }
}

// ----------------------------------------------------------------------------
// Normalized Records
// ----------------------------------------------------------------------------

/// Canonical message record handed to the storage collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    pub source: String,
    pub body: String,
    pub flags: u32,
    pub timestamp: Timestamp,
    pub outgoing: bool,
    pub sent: bool,
    pub has_attachment: bool,
    pub mime_type: Option<String>,
    pub attachment_saved: bool,
    pub attachment_path: Option<PathBuf>,
}

/// Conversation summary returned by the storage collaborator after ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub source: String,
    /// Preview text of the latest message in the conversation
    pub preview: String,
    pub is_group: bool,
}

/// Result of a successful `MessageStore::process_message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub session: SessionSummary,
    pub message_id: MessageId,
}

/// Stored conversation and message a receipt applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub session_id: SessionId,
    pub message_id: MessageId,
}

impl CorrelationResult {
    pub fn new(session_id: SessionId, message_id: MessageId) -> Self {
        Self {
            session_id,
            message_id,
        }
    }
}
