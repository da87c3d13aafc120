//! Transport Session Trait Definition
//!
//! Defines the interface the connection supervisor drives. The wire protocol
//! and its cryptographic session live behind this trait; concrete
//! implementations belong to the application embedding the runtime.

use async_trait::async_trait;

use crate::channel::utils::InboundSender;
use crate::errors::TransportError;

// ----------------------------------------------------------------------------
// Transport Session Trait
// ----------------------------------------------------------------------------

/// Streaming connection to the push service
///
/// ## Lifecycle
///
/// The supervisor is the only caller of `open` and `start_listening` and never
/// calls them concurrently. One connection cycle is:
///
/// 1. `open()` establishes the stream; an error counts as a failed attempt
/// 2. `start_listening()` blocks while the stream is alive, pushing every
///    inbound message and receipt into the attached channel in arrival order
/// 3. it returns when the stream ends, with `Ok` for a clean close
///
/// `stop_listening()` may be called from any task at any time and must make a
/// running `start_listening()` return promptly. It must not block.
#[async_trait]
pub trait TransportSession: Send + Sync {
    /// Attach the channel inbound events are delivered on
    ///
    /// Called once by the runtime before the supervisor starts.
    fn attach(&mut self, inbound: InboundSender) -> Result<(), TransportError>;

    /// Establish the streaming connection
    async fn open(&self) -> Result<(), TransportError>;

    /// Deliver inbound events until the connection ends or is stopped
    async fn start_listening(&self) -> Result<(), TransportError>;

    /// Force a running `start_listening` to return
    fn stop_listening(&self);

    /// Name used in log lines
    fn name(&self) -> &str {
        "transport"
    }
}
