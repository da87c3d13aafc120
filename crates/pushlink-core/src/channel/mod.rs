//! Channel schema and constructors
//!
//! - `communication`: the `AppEvent` notifications the runtime emits
//! - `utils`: typed channel aliases and constructors sized from `ChannelConfig`

pub mod communication;
pub mod utils;

pub use communication::AppEvent;
pub use utils::*;
