//! Wire protocol for the gimbal link.
//!
//! - **Types** ([`OutboundHeader`], [`InboundHeader`], [`Command`],
//!   [`Message`]) — what travels on the wire.
//! - **Codec** ([`LineCodec`]) — commands to lines, lines to messages.
//! - **Replies** ([`Reply`], [`Version`], [`DataSample`], ...) — typed
//!   views over message payloads.
//! - **Read-retry engine** ([`await_header`], [`RetryBudget`]) — finding
//!   the wanted reply among unrelated traffic.
//!
//! # Architecture
//!
//! ```text
//! Channel (lines) → Protocol (Command / Message) → Session (gimbal state)
//! ```
//!
//! Nothing in this crate holds a channel or any session state; the channel
//! is lent to [`await_header`] for a single call.

mod codec;
mod error;
mod reply;
mod retry;
mod types;

pub use codec::{LineCodec, DEFAULT_DELIMITER};
pub use error::ProtocolError;
pub use reply::{DataSample, DeviceName, Reply, Version, Warning};
pub use retry::{await_header, ReadOutcome, RetryBudget};
pub use types::{
    Command, Header, InboundHeader, Message, OutboundHeader, Scalar,
};
