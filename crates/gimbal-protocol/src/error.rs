//! Error types for the protocol layer.
//!
//! Two families live here. Validation errors (`InvalidHeader`,
//! `InvalidPayload`, `InvalidDelimiter`) are raised before any I/O and
//! are safe to retry with corrected input. Decode errors
//! (`UnrecognizedHeader`, `MalformedPayload`) describe a line that came
//! off the wire; the read-retry engine treats them as noise, but they
//! reach the caller when they occur inside an already matched reply.

use gimbal_channel::ChannelError;

use crate::InboundHeader;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A header name that is not a known outbound command.
    #[error("invalid header: {0:?}")]
    InvalidHeader(String),

    /// A command value that cannot be put on the wire.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// A delimiter that would collide with the rest of the wire format.
    #[error("invalid delimiter: {0:?}")]
    InvalidDelimiter(char),

    /// An inbound line whose leading token is not a known header.
    #[error("unrecognized header: {0:?}")]
    UnrecognizedHeader(String),

    /// An inbound line whose payload does not have the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The retry budget ran out before a line with the wanted header
    /// arrived.
    #[error("no {header} reply after {attempts} reads")]
    ReadExhausted {
        header: InboundHeader,
        attempts: u32,
    },

    /// The channel failed underneath the protocol.
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_exhausted_display_names_header() {
        let err = ProtocolError::ReadExhausted {
            header: InboundHeader::Version,
            attempts: 50,
        };
        assert_eq!(err.to_string(), "no VERS reply after 50 reads");
    }

    #[test]
    fn test_from_channel_error() {
        let err: ProtocolError = ChannelError::Closed.into();
        assert!(matches!(err, ProtocolError::Channel(ChannelError::Closed)));
    }
}
