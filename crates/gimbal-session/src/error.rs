//! Error types for the session layer.

use gimbal_channel::ChannelError;
use gimbal_protocol::{InboundHeader, ProtocolError};

use crate::SessionState;

/// Errors returned by [`Session`](crate::Session) operations.
///
/// `Channel` and `HandshakeFailed` always come with a transition to
/// [`SessionState::Failed`]; the caller must `connect` again. The other
/// variants leave the state untouched.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a `Ready` session.
    #[error("not connected (session is {0})")]
    NotConnected(SessionState),

    /// The command was rejected before anything was written.
    #[error("invalid command: {0}")]
    InvalidCommand(#[source] ProtocolError),

    /// The configuration cannot be used (e.g. a bad delimiter).
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[source] ProtocolError),

    /// The connected device did not prove to be the gimbal.
    #[error("handshake failed: {0}")]
    HandshakeFailed(#[source] HandshakeFailure),

    /// The wanted reply did not arrive within the retry budget.
    #[error("no {header} reply after {attempts} reads")]
    ReadExhausted {
        header: InboundHeader,
        attempts: u32,
    },

    /// A matched reply carried a payload of the wrong shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The channel failed; the session is now `Failed`.
    #[error("channel error: {0}")]
    Channel(#[source] ChannelError),
}

/// Why an identity handshake was rejected.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeFailure {
    /// A `DEVN` reply arrived but named another device.
    #[error("expected device {expected:?}, got payload {payload:?}")]
    WrongDevice { expected: String, payload: String },

    /// No usable `DEVN` reply: budget exhausted, channel error, ...
    #[error("no identity reply: {0}")]
    Read(#[source] ProtocolError),
}

impl From<ProtocolError> for SessionError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidHeader(_)
            | ProtocolError::InvalidPayload(_)
            | ProtocolError::InvalidDelimiter(_) => Self::InvalidCommand(err),
            ProtocolError::UnrecognizedHeader(msg)
            | ProtocolError::MalformedPayload(msg) => Self::MalformedPayload(msg),
            ProtocolError::ReadExhausted { header, attempts } => {
                Self::ReadExhausted { header, attempts }
            }
            ProtocolError::Channel(err) => Self::Channel(err),
        }
    }
}
