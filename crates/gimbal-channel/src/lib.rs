//! Byte channel abstraction for the gimbal link.
//!
//! Provides the [`Channel`] trait: a line-oriented duplex stream that the
//! protocol engine reads replies from and writes commands to. The engine
//! never opens or configures a channel itself; it is handed one that is
//! already open.
//!
//! # Feature Flags
//!
//! - `serial` (default) — [`SerialChannel`] backed by the `serialport` crate
//! - `mock` — [`mock::ScriptedChannel`], a scripted channel for tests

#![allow(async_fn_in_trait)]

mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "serial")]
mod serial;

pub use error::ChannelError;
#[cfg(feature = "serial")]
pub use serial::{SerialChannel, SerialSettings};

use std::time::Duration;

/// A duplex, line-oriented byte stream to the remote controller.
///
/// Implementations own the underlying resource exclusively. The session
/// holds at most one channel and lends it (`&mut`) to the codec and the
/// read-retry engine for the duration of a single call.
pub trait Channel: Send + 'static {
    /// Writes the bytes of one wire line.
    ///
    /// Writes are best-effort: a failure is reported immediately and is
    /// never retried at this layer.
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError>;

    /// Reads the next newline-terminated line, without the terminator.
    ///
    /// Returns `Ok(None)` when `timeout` elapses before a full line
    /// arrives. A timeout is not an error.
    async fn read_line(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<String>, ChannelError>;

    /// Releases the underlying resource.
    async fn close(&mut self) -> Result<(), ChannelError>;

    /// Human-readable name for logs (e.g. the device path).
    fn name(&self) -> &str;
}

/// Splits the first complete line off `pending`.
///
/// The trailing `\n` and an optional `\r` are stripped. Bytes are decoded
/// as lossy UTF-8 so a corrupted byte never aborts a read. Returns `None`
/// if `pending` holds no newline yet.
pub fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = pending.drain(..=end).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(String::from_utf8_lossy(&line).into_owned())
}
