//! Session management for the gimbal link.
//!
//! This crate turns a raw [`Channel`](gimbal_channel::Channel) into a
//! verified gimbal connection:
//!
//! 1. **Handshake** — wait for the controller to boot, then prove its
//!    identity with `GETDN` / `DEVN` ([`Session::connect`])
//! 2. **Commands** — typed operations that encode and write one line each
//! 3. **Replies** — waiting for a specific reply through the read-retry
//!    engine ([`Session::await_reply`])
//! 4. **Diagnostics** — every line sent or accepted goes to a [`LogSink`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Application (above)  ← connect, set_position, get_version, ...
//!     ↕
//! Session Layer (this crate)  ← lifecycle, handshake, failure handling
//!     ↕
//! Protocol Layer (below)  ← Command / Message, LineCodec, await_header
//! ```

mod error;
mod session;
mod shared;
mod sink;
mod state;

pub use error::{HandshakeFailure, SessionError};
pub use session::Session;
pub use shared::SharedSession;
pub use sink::{LogEvent, LogSink, NullSink, TracingSink};
pub use state::{Gain, SessionConfig, SessionState};
