//! Core protocol types: headers, scalars, commands, and messages.
//!
//! Headers are closed enums. A header that is not in the enum cannot be
//! constructed, so only text coming from outside the program (the wire or
//! a user-supplied name) needs runtime validation.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Outbound headers
// ---------------------------------------------------------------------------

/// Commands the host may send to the gimbal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundHeader {
    /// Proportional gain (`TUNEP`).
    TuneP,
    /// Integral gain (`TUNEI`).
    TuneI,
    /// Derivative gain (`TUNED`).
    TuneD,
    /// Control loop setpoint (`SETSP`).
    SetSetpoint,
    /// Control loop deadband (`SETDB`).
    SetDeadband,
    /// Rotation direction, 1 or 0 (`SETDR`).
    SetDirection,
    /// Target position in degrees (`SETPO`).
    SetPosition,
    /// Motor enable, 1 or 0 (`SETEN`).
    SetEnable,
    /// Gyro calibration (`CALGY`).
    CalibrateGyro,
    /// Epoch query (`GETEP`).
    GetEpoch,
    /// Firmware version query (`GETVE`).
    GetVersion,
    /// Device name query (`GETDN`).
    GetDeviceName,
}

impl OutboundHeader {
    /// Every outbound header, in wire-table order.
    pub const ALL: [OutboundHeader; 12] = [
        Self::TuneP,
        Self::TuneI,
        Self::TuneD,
        Self::SetSetpoint,
        Self::SetDeadband,
        Self::SetDirection,
        Self::SetPosition,
        Self::SetEnable,
        Self::CalibrateGyro,
        Self::GetEpoch,
        Self::GetVersion,
        Self::GetDeviceName,
    ];

    /// The header as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TuneP => "TUNEP",
            Self::TuneI => "TUNEI",
            Self::TuneD => "TUNED",
            Self::SetSetpoint => "SETSP",
            Self::SetDeadband => "SETDB",
            Self::SetDirection => "SETDR",
            Self::SetPosition => "SETPO",
            Self::SetEnable => "SETEN",
            Self::CalibrateGyro => "CALGY",
            Self::GetEpoch => "GETEP",
            Self::GetVersion => "GETVE",
            Self::GetDeviceName => "GETDN",
        }
    }
}

impl fmt::Display for OutboundHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutboundHeader {
    type Err = ProtocolError;

    /// Case-sensitive lookup of a wire header.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| ProtocolError::InvalidHeader(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Inbound headers
// ---------------------------------------------------------------------------

/// Line types the gimbal may send to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundHeader {
    /// Free-text warning (`WARN`).
    Warning,
    /// Control loop telemetry (`LOOP`).
    Loop,
    /// Measurement sample: `angle,time_us` (`DATA`).
    Data,
    /// Stored configuration dump (`EEPR`).
    Eeprom,
    /// Firmware version: `major,minor` (`VERS`).
    Version,
    /// Device identity (`DEVN`).
    DeviceName,
}

impl InboundHeader {
    /// Every inbound header.
    pub const ALL: [InboundHeader; 6] = [
        Self::Warning,
        Self::Loop,
        Self::Data,
        Self::Eeprom,
        Self::Version,
        Self::DeviceName,
    ];

    /// The header as it appears on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "WARN",
            Self::Loop => "LOOP",
            Self::Data => "DATA",
            Self::Eeprom => "EEPR",
            Self::Version => "VERS",
            Self::DeviceName => "DEVN",
        }
    }
}

impl fmt::Display for InboundHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InboundHeader {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| ProtocolError::UnrecognizedHeader(s.to_string()))
    }
}

/// A header tagged with its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Header {
    /// Host → gimbal.
    Outbound(OutboundHeader),
    /// Gimbal → host.
    Inbound(InboundHeader),
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outbound(h) => fmt::Display::fmt(h, f),
            Self::Inbound(h) => fmt::Display::fmt(h, f),
        }
    }
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

/// The single numeric value a command carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    /// Whether the value can be written to the wire.
    pub fn is_finite(self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(v) => v.is_finite(),
        }
    }
}

impl fmt::Display for Scalar {
    /// Integers print without a decimal point. Floats print in shortest
    /// round-trip form and always keep a decimal point (`5.0`, `1.5`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                write!(f, "{v:.1}")
            }
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for Scalar {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(v) = s.parse::<i64>() {
            return Ok(Self::Int(v));
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self::Float(v)),
            _ => Err(ProtocolError::InvalidPayload(format!(
                "{s:?} is not a finite number"
            ))),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<u8> for Scalar {
    fn from(v: u8) -> Self {
        Self::Int(v.into())
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// An outbound header paired with exactly one scalar.
///
/// Any scalar is accepted for any header; the firmware does its own
/// range handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub header: OutboundHeader,
    pub value: Scalar,
}

impl Command {
    pub fn new(header: OutboundHeader, value: impl Into<Scalar>) -> Self {
        Self {
            header,
            value: value.into(),
        }
    }

    /// A query or trigger command; these carry a `0` payload.
    pub fn query(header: OutboundHeader) -> Self {
        Self::new(header, 0)
    }

    /// Builds a command from a header name given as text.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidHeader`] if `header` is not an outbound
    /// header.
    pub fn parse(
        header: &str,
        value: impl Into<Scalar>,
    ) -> Result<Self, ProtocolError> {
        Ok(Self::new(header.parse()?, value))
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A decoded wire line.
///
/// `fields` are the comma-separated payload tokens, kept as text; numeric
/// coercion is left to the caller ([`Message::parse_field`]). `raw` is the
/// trimmed line as received, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub fields: Vec<String>,
    pub raw: String,
}

impl Message {
    /// The inbound header, if this message travelled gimbal → host.
    pub fn inbound_header(&self) -> Option<InboundHeader> {
        match self.header {
            Header::Inbound(h) => Some(h),
            Header::Outbound(_) => None,
        }
    }

    /// The payload field at `index`.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedPayload`] if the field is absent.
    pub fn field(&self, index: usize) -> Result<&str, ProtocolError> {
        self.fields.get(index).map(String::as_str).ok_or_else(|| {
            ProtocolError::MalformedPayload(format!(
                "{}: missing field {index} in {:?}",
                self.header, self.raw
            ))
        })
    }

    /// Parses the payload field at `index` as `T`, ignoring surrounding
    /// whitespace.
    ///
    /// # Errors
    /// [`ProtocolError::MalformedPayload`] if the field is absent or does
    /// not parse.
    pub fn parse_field<T: FromStr>(
        &self,
        index: usize,
    ) -> Result<T, ProtocolError> {
        let text = self.field(index)?;
        text.trim().parse().map_err(|_| {
            ProtocolError::MalformedPayload(format!(
                "{}: field {index} ({text:?}) is not a valid {}",
                self.header,
                std::any::type_name::<T>()
            ))
        })
    }

    /// The payload with its sub-fields joined back together.
    pub fn payload(&self) -> String {
        self.fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbound_header_from_str_round_trips_all() {
        for header in OutboundHeader::ALL {
            assert_eq!(header.as_str().parse::<OutboundHeader>().unwrap(), header);
        }
    }

    #[test]
    fn test_outbound_header_from_str_is_case_sensitive() {
        let result = "setpo".parse::<OutboundHeader>();
        assert!(matches!(result, Err(ProtocolError::InvalidHeader(h)) if h == "setpo"));
    }

    #[test]
    fn test_inbound_header_unknown_is_unrecognized() {
        let result = "NOPE".parse::<InboundHeader>();
        assert!(matches!(result, Err(ProtocolError::UnrecognizedHeader(_))));
    }

    #[test]
    fn test_header_sets_do_not_overlap() {
        for out in OutboundHeader::ALL {
            assert!(out.as_str().parse::<InboundHeader>().is_err());
        }
    }

    #[test]
    fn test_scalar_display_int_has_no_decimal_point() {
        assert_eq!(Scalar::Int(90).to_string(), "90");
        assert_eq!(Scalar::Int(-3).to_string(), "-3");
    }

    #[test]
    fn test_scalar_display_float_keeps_decimal_point() {
        assert_eq!(Scalar::Float(5.0).to_string(), "5.0");
        assert_eq!(Scalar::Float(1.5).to_string(), "1.5");
        assert_eq!(Scalar::Float(0.1).to_string(), "0.1");
        assert_eq!(Scalar::Float(-2.25).to_string(), "-2.25");
    }

    #[test]
    fn test_scalar_from_str_prefers_int() {
        assert_eq!("90".parse::<Scalar>().unwrap(), Scalar::Int(90));
        assert_eq!("1.5".parse::<Scalar>().unwrap(), Scalar::Float(1.5));
        assert_eq!("5.0".parse::<Scalar>().unwrap(), Scalar::Float(5.0));
    }

    #[test]
    fn test_scalar_from_str_rejects_non_finite_and_text() {
        assert!("inf".parse::<Scalar>().is_err());
        assert!("NaN".parse::<Scalar>().is_err());
        assert!("ninety".parse::<Scalar>().is_err());
        assert!("".parse::<Scalar>().is_err());
    }

    #[test]
    fn test_scalar_from_bool() {
        assert_eq!(Scalar::from(true), Scalar::Int(1));
        assert_eq!(Scalar::from(false), Scalar::Int(0));
    }

    #[test]
    fn test_command_query_carries_zero() {
        let cmd = Command::query(OutboundHeader::GetVersion);
        assert_eq!(cmd.value, Scalar::Int(0));
    }

    #[test]
    fn test_command_parse_unknown_header_fails() {
        assert!(matches!(
            Command::parse("FIRE", 1),
            Err(ProtocolError::InvalidHeader(_))
        ));
        assert_eq!(
            Command::parse("SETDB", 1.5).unwrap(),
            Command::new(OutboundHeader::SetDeadband, 1.5)
        );
    }

    fn data_message() -> Message {
        Message {
            header: Header::Inbound(InboundHeader::Data),
            fields: vec!["12.5".into(), "1500".into()],
            raw: "DATA;12.5,1500".into(),
        }
    }

    #[test]
    fn test_message_parse_field() {
        let msg = data_message();
        assert_eq!(msg.parse_field::<f64>(0).unwrap(), 12.5);
        assert_eq!(msg.parse_field::<u64>(1).unwrap(), 1500);
        assert_eq!(msg.inbound_header(), Some(InboundHeader::Data));
        assert_eq!(msg.payload(), "12.5,1500");
    }

    #[test]
    fn test_message_missing_or_bad_field_is_malformed() {
        let msg = data_message();
        assert!(matches!(
            msg.field(2),
            Err(ProtocolError::MalformedPayload(_))
        ));
        assert!(matches!(
            msg.parse_field::<u64>(0),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }
}
