//! Unified error type for the gimbal crates.

use gimbal_channel::ChannelError;
use gimbal_protocol::ProtocolError;
use gimbal_session::SessionError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// Applications using the `gimbal` crate deal with this one type; `?`
/// converts the layer errors through the generated `From` impls.
#[derive(Debug, thiserror::Error)]
pub enum GimbalError {
    /// Opening, reading or writing the channel failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A command or reply line was invalid.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Handshake, state or reply error from the session.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
