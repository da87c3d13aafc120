//! Pushlink Core
//!
//! Foundational types for the Pushlink connection supervisor: the inbound event
//! and normalized message model, the collaborator interfaces the runtime talks to
//! (transport, network monitor, message store, settings), configuration, and the
//! notification channel schema.
//!
//! The runtime engine itself lives in `pushlink-runtime`; this crate only defines
//! the stable API that transports, storage backends and UI layers depend on.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod config;
pub mod errors;
pub mod message;
pub mod network;
pub mod settings;
pub mod storage;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{
    communication::AppEvent,
    utils::{
        create_app_event_channel, create_inbound_channel, create_receipt_queue,
        AppEventReceiver, AppEventSender, ChannelError, InboundReceiver, InboundSender,
        NonBlockingSend, ReceiptQueueReceiver, ReceiptQueueSender,
    },
};
pub use config::{ChannelConfig, DispatchConfig, PushlinkConfig, RetryConfig, SupervisorConfig};
pub use errors::{
    AttachmentError, ConfigError, CorrelationError, PushlinkError, PushlinkResult, StorageError,
    TransportError,
};
pub use message::{
    Attachment, ChatMessage, CorrelationResult, GroupAction, GroupContext, InboundEvent,
    NormalizedMessage, Receipt, SessionSummary, StoredMessage,
};
pub use network::{
    ManualNetworkMonitor, NetworkConfigEvent, NetworkConfigState, NetworkEventReceiver,
    NetworkMonitor,
};
pub use settings::{ClientSettings, Settings, SharedSettings};
pub use storage::MessageStore;
pub use transport::TransportSession;
pub use types::{ConnectionState, MessageId, SessionId, Timestamp};
