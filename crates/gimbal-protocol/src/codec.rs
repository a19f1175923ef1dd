//! The line codec: typed commands to wire lines, wire lines to messages.
//!
//! Wire format, one message per newline-terminated line:
//!
//! ```text
//! SETPO;90\n          outbound: HEADER<delim>SCALAR
//! VERS;1,3\n          inbound:  HEADER<delim>FIELD[,FIELD...]
//! ```
//!
//! The codec is stateless apart from the delimiter and never touches a
//! channel.

use crate::{
    Command, Header, InboundHeader, Message, OutboundHeader, ProtocolError,
    Scalar,
};

/// Delimiter between header and payload used by the gimbal firmware.
pub const DEFAULT_DELIMITER: char = ';';

/// Separator between payload sub-fields.
const FIELD_SEPARATOR: char = ',';

/// Encodes commands and decodes replies for a given delimiter.
///
/// ```rust
/// use gimbal_protocol::{Command, LineCodec, OutboundHeader};
///
/// let codec = LineCodec::default();
/// let line = codec.encode(&Command::new(OutboundHeader::SetPosition, 90)).unwrap();
/// assert_eq!(line, "SETPO;90\n");
///
/// let msg = codec.decode("VERS;1,3\n").unwrap().expect("a message");
/// assert_eq!(msg.fields, ["1", "3"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCodec {
    delimiter: char,
}

impl LineCodec {
    /// Creates a codec with a custom delimiter.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidDelimiter`] for `,` or any whitespace,
    /// which would make lines ambiguous.
    pub fn new(delimiter: char) -> Result<Self, ProtocolError> {
        if delimiter == FIELD_SEPARATOR || delimiter.is_whitespace() {
            return Err(ProtocolError::InvalidDelimiter(delimiter));
        }
        Ok(Self { delimiter })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Renders `command` as a complete wire line, terminator included.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidPayload`] if the value is NaN or infinite.
    pub fn encode(&self, command: &Command) -> Result<String, ProtocolError> {
        if !command.value.is_finite() {
            return Err(ProtocolError::InvalidPayload(format!(
                "{} value {} is not finite",
                command.header, command.value
            )));
        }
        Ok(format!(
            "{}{}{}\n",
            command.header, self.delimiter, command.value
        ))
    }

    /// Decodes one inbound line.
    ///
    /// Blank and whitespace-only lines are "no message" (`Ok(None)`), not
    /// an error. A correctly delimited line with an empty payload decodes
    /// to a message with no fields. Only the line as a whole is trimmed;
    /// payload tokens keep their text, spaces included.
    ///
    /// # Errors
    /// - [`ProtocolError::UnrecognizedHeader`] if the leading token is not
    ///   an inbound header (matched case-sensitively).
    /// - [`ProtocolError::MalformedPayload`] if the delimiter is missing or
    ///   appears more than once.
    pub fn decode(&self, raw: &str) -> Result<Option<Message>, ProtocolError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, payload) = self.split(line);
        let header: InboundHeader = head.parse()?;
        let payload = self.payload_of(line, payload)?;

        Ok(Some(Message {
            header: Header::Inbound(header),
            fields: split_fields(payload),
            raw: line.to_string(),
        }))
    }

    /// Decodes an outbound line back into a [`Command`].
    ///
    /// This is the inverse of [`LineCodec::encode`]; device simulators use
    /// it to interpret what the host wrote.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidHeader`] for an unknown command header.
    /// - [`ProtocolError::MalformedPayload`] for a missing or repeated
    ///   delimiter.
    /// - [`ProtocolError::InvalidPayload`] if the payload is not a single
    ///   finite number.
    pub fn decode_command(
        &self,
        raw: &str,
    ) -> Result<Option<Command>, ProtocolError> {
        let line = raw.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, payload) = self.split(line);
        let header: OutboundHeader = head.parse()?;
        let value: Scalar = self.payload_of(line, payload)?.trim().parse()?;

        Ok(Some(Command { header, value }))
    }

    fn split<'a>(&self, line: &'a str) -> (&'a str, Option<&'a str>) {
        match line.split_once(self.delimiter) {
            Some((head, payload)) => (head, Some(payload)),
            None => (line, None),
        }
    }

    fn payload_of<'a>(
        &self,
        line: &str,
        payload: Option<&'a str>,
    ) -> Result<&'a str, ProtocolError> {
        let payload = payload.ok_or_else(|| {
            ProtocolError::MalformedPayload(format!(
                "missing {:?} delimiter in {line:?}",
                self.delimiter
            ))
        })?;
        if payload.contains(self.delimiter) {
            return Err(ProtocolError::MalformedPayload(format!(
                "repeated {:?} delimiter in {line:?}",
                self.delimiter
            )));
        }
        Ok(payload)
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

/// Splits a payload into its comma-separated tokens, text untouched.
fn split_fields(payload: &str) -> Vec<String> {
    if payload.is_empty() {
        return Vec::new();
    }
    payload.split(FIELD_SEPARATOR).map(str::to_string).collect()
}
