//! Typed views over inbound messages.
//!
//! The codec keeps payload fields as text. Each [`Reply`] type knows which
//! header it answers to and how to coerce that header's fields.

use crate::{InboundHeader, Message, ProtocolError};

/// A typed payload extracted from one kind of inbound message.
pub trait Reply: Sized {
    /// The header this reply is carried under.
    const HEADER: InboundHeader;

    /// Builds the reply from a message that carries [`Self::HEADER`].
    ///
    /// # Errors
    /// [`ProtocolError::MalformedPayload`] if the message has another
    /// header or its fields do not fit.
    fn from_message(message: &Message) -> Result<Self, ProtocolError>;
}

fn expect_header(
    message: &Message,
    header: InboundHeader,
) -> Result<(), ProtocolError> {
    if message.inbound_header() == Some(header) {
        Ok(())
    } else {
        Err(ProtocolError::MalformedPayload(format!(
            "expected a {header} line, got {:?}",
            message.raw
        )))
    }
}

fn expect_arity(message: &Message, arity: usize) -> Result<(), ProtocolError> {
    if message.fields.len() == arity {
        Ok(())
    } else {
        Err(ProtocolError::MalformedPayload(format!(
            "{}: expected {arity} fields, got {} in {:?}",
            message.header,
            message.fields.len(),
            message.raw
        )))
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Firmware version from a `VERS;major,minor` line.
///
/// Components stay text: the firmware does not promise they are numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: String,
    pub minor: String,
}

impl Version {
    pub fn into_tuple(self) -> (String, String) {
        (self.major, self.minor)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Reply for Version {
    const HEADER: InboundHeader = InboundHeader::Version;

    fn from_message(message: &Message) -> Result<Self, ProtocolError> {
        expect_header(message, Self::HEADER)?;
        expect_arity(message, 2)?;
        let major = message.field(0)?;
        let minor = message.field(1)?;
        if major.trim().is_empty() || minor.trim().is_empty() {
            return Err(ProtocolError::MalformedPayload(format!(
                "empty version component in {:?}",
                message.raw
            )));
        }
        Ok(Self {
            major: major.to_string(),
            minor: minor.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// DataSample
// ---------------------------------------------------------------------------

/// One measurement from a `DATA;angle,time_us` line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataSample {
    /// Measured angle in degrees.
    pub angle_deg: f64,
    /// Controller clock in microseconds.
    pub timestamp_us: u64,
}

impl Reply for DataSample {
    const HEADER: InboundHeader = InboundHeader::Data;

    fn from_message(message: &Message) -> Result<Self, ProtocolError> {
        expect_header(message, Self::HEADER)?;
        expect_arity(message, 2)?;
        Ok(Self {
            angle_deg: message.parse_field(0)?,
            timestamp_us: message.parse_field(1)?,
        })
    }
}

// ---------------------------------------------------------------------------
// DeviceName / Warning
// ---------------------------------------------------------------------------

/// Identity string from a `DEVN` line (its first payload field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceName(pub String);

impl Reply for DeviceName {
    const HEADER: InboundHeader = InboundHeader::DeviceName;

    fn from_message(message: &Message) -> Result<Self, ProtocolError> {
        expect_header(message, Self::HEADER)?;
        Ok(Self(message.field(0)?.to_string()))
    }
}

/// Free text from a `WARN` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning(pub String);

impl Reply for Warning {
    const HEADER: InboundHeader = InboundHeader::Warning;

    fn from_message(message: &Message) -> Result<Self, ProtocolError> {
        expect_header(message, Self::HEADER)?;
        Ok(Self(message.payload()))
    }
}
