//! The session: one gimbal link from handshake to teardown.
//!
//! A [`Session`] owns at most one [`Channel`] at a time. It is responsible
//! for:
//! - Waiting out the controller's reset after the port opens
//! - Proving the device on the other end is the gimbal (`GETDN` / `DEVN`)
//! - Encoding commands and writing them
//! - Waiting for replies through the read-retry engine
//! - Releasing the channel exactly once on failure or disconnect
//!
//! # Concurrency note
//!
//! Every operation takes `&mut self`, so a session serializes its own
//! commands: a request and its reply can never interleave with another
//! request on the same link. Share it through
//! [`SharedSession`](crate::SharedSession) when several tasks need it.

use gimbal_channel::{Channel, ChannelError};
use gimbal_protocol::{
    await_header, Command, DataSample, DeviceName, InboundHeader, LineCodec,
    Message, OutboundHeader, ProtocolError, ReadOutcome, Reply, Scalar,
    Version,
};

use crate::sink::{record, LogEvent, LogSink, TracingSink};
use crate::{Gain, HandshakeFailure, SessionConfig, SessionError, SessionState};

/// A connection to the gimbal controller.
///
/// ## Lifecycle
///
/// ```text
/// new() ──→ connect(channel) ──→ commands... ──→ disconnect()
///               │                    │
///               ▼                    ▼ (channel error)
///        HandshakeFailed          [Failed] ──→ connect(channel) again
/// ```
///
/// Dropping a session drops its channel, which closes the port.
pub struct Session<C: Channel, L: LogSink = TracingSink> {
    config: SessionConfig,
    codec: LineCodec,
    sink: L,
    state: SessionState,

    /// `Some` from `connect` until the channel is released.
    channel: Option<C>,
}

impl<C: Channel> Session<C> {
    /// Creates a disconnected session that logs wire traffic to `tracing`.
    ///
    /// # Errors
    /// [`SessionError::InvalidConfig`] if the delimiter cannot be used.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        Self::with_sink(config, TracingSink)
    }
}

impl<C: Channel, L: LogSink> Session<C, L> {
    /// Creates a disconnected session reporting to `sink`.
    ///
    /// # Errors
    /// [`SessionError::InvalidConfig`] if the delimiter cannot be used.
    pub fn with_sink(
        config: SessionConfig,
        sink: L,
    ) -> Result<Self, SessionError> {
        let codec = LineCodec::new(config.delimiter)
            .map_err(SessionError::InvalidConfig)?;
        Ok(Self {
            config,
            codec,
            sink,
            state: SessionState::Disconnected,
            channel: None,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    /// Name of the held channel, if any.
    pub fn channel_name(&self) -> Option<&str> {
        self.channel.as_ref().map(Channel::name)
    }

    // =====================================================================
    // Connection lifecycle
    // =====================================================================

    /// Takes `channel` and runs the identity handshake.
    ///
    /// Any channel already held is released first, whatever the current
    /// state. The session then waits `boot_settle`, sends `GETDN;0`, and
    /// waits for a `DEVN` reply whose payload is exactly
    /// `expected_device`.
    ///
    /// # Errors
    /// [`SessionError::HandshakeFailed`] if no identity reply arrives, the
    /// identity does not match, or the channel fails. The channel has
    /// been closed and the session is `Failed`.
    pub async fn connect(&mut self, channel: C) -> Result<(), SessionError> {
        if self.channel.is_some() {
            tracing::info!(state = %self.state, "releasing previous channel before reconnect");
            self.release().await;
        }

        let port = channel.name().to_string();
        self.channel = Some(channel);
        self.state = SessionState::Connecting;
        tracing::info!(%port, settle = ?self.config.boot_settle, "connecting");
        tokio::time::sleep(self.config.boot_settle).await;

        match self.identify().await {
            Ok(()) => {
                self.state = SessionState::Ready;
                tracing::info!(%port, device = %self.config.expected_device, "gimbal ready");
                Ok(())
            }
            Err(failure) => {
                tracing::warn!(%port, error = %failure, "handshake failed");
                let err = SessionError::HandshakeFailed(failure);
                record(&self.sink, LogEvent::Error(&err.to_string()));
                self.state = SessionState::Failed;
                self.release().await;
                Err(err)
            }
        }
    }

    /// Sends the identity query and checks the reply.
    async fn identify(&mut self) -> Result<(), HandshakeFailure> {
        let Some(channel) = self.channel.as_mut() else {
            return Err(HandshakeFailure::Read(ChannelError::Closed.into()));
        };

        let line = self
            .codec
            .encode(&Command::query(OutboundHeader::GetDeviceName))
            .map_err(HandshakeFailure::Read)?;
        let written = channel.write(line.as_bytes()).await;
        written.map_err(|err| HandshakeFailure::Read(err.into()))?;
        record(&self.sink, LogEvent::Sent(line.trim_end()));
        self.state = SessionState::Identifying;

        let message = await_header(
            channel,
            &self.codec,
            InboundHeader::DeviceName,
            &self.config.budget,
        )
        .await
        .into_result()
        .map_err(HandshakeFailure::Read)?;
        record(&self.sink, LogEvent::Received(&message.raw));

        // The whole payload is the identity; extra sub-fields are rejected.
        let payload = message.payload();
        if payload == self.config.expected_device {
            Ok(())
        } else {
            Err(HandshakeFailure::WrongDevice {
                expected: self.config.expected_device.clone(),
                payload,
            })
        }
    }

    /// Releases the channel and returns to `Disconnected`.
    ///
    /// Idempotent; close errors are logged and swallowed.
    pub async fn disconnect(&mut self) {
        if self.channel.is_some() {
            tracing::info!(state = %self.state, "disconnecting");
        }
        self.release().await;
        self.state = SessionState::Disconnected;
    }

    /// Closes and drops the held channel, if any.
    async fn release(&mut self) {
        let Some(mut channel) = self.channel.take() else {
            return;
        };
        if let Err(err) = channel.close().await {
            tracing::debug!(port = %channel.name(), error = %err, "close failed; dropping channel anyway");
        }
    }

    /// Moves to `Failed` after a channel error and releases the channel.
    async fn fail(&mut self, err: ChannelError) -> SessionError {
        tracing::warn!(error = %err, "channel failed");
        let err = SessionError::Channel(err);
        record(&self.sink, LogEvent::Error(&err.to_string()));
        self.state = SessionState::Failed;
        self.release().await;
        err
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(SessionError::NotConnected(self.state))
        }
    }

    // =====================================================================
    // Generic send / receive
    // =====================================================================

    /// Encodes and writes `command`.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`] unless `Ready`
    /// - [`SessionError::InvalidCommand`] if the value is not finite;
    ///   nothing is written
    /// - [`SessionError::Channel`] if the write fails; the session is now
    ///   `Failed`
    pub async fn send(&mut self, command: Command) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let line = self
            .codec
            .encode(&command)
            .map_err(SessionError::InvalidCommand)?;

        let Some(channel) = self.channel.as_mut() else {
            return Err(SessionError::NotConnected(self.state));
        };
        let written = channel.write(line.as_bytes()).await;
        match written {
            Ok(()) => {
                tracing::debug!(command = %command.header, value = %command.value, "sent");
                record(&self.sink, LogEvent::Sent(line.trim_end()));
                Ok(())
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    /// Sends a command given by header name, for commands without a
    /// dedicated method.
    ///
    /// # Errors
    /// As [`Session::send`], plus [`SessionError::InvalidCommand`] for an
    /// unknown header.
    pub async fn send_raw(
        &mut self,
        header: &str,
        value: impl Into<Scalar>,
    ) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let command =
            Command::parse(header, value).map_err(SessionError::InvalidCommand)?;
        self.send(command).await
    }

    /// Waits for the next line carrying `header`, skipping everything else.
    ///
    /// # Errors
    /// - [`SessionError::NotConnected`] unless `Ready`
    /// - [`SessionError::ReadExhausted`] if the budget runs out; the
    ///   session stays `Ready`
    /// - [`SessionError::Channel`] if a read fails; the session is now
    ///   `Failed`
    pub async fn await_reply(
        &mut self,
        header: InboundHeader,
    ) -> Result<Message, SessionError> {
        self.ensure_ready()?;
        let Some(channel) = self.channel.as_mut() else {
            return Err(SessionError::NotConnected(self.state));
        };

        let outcome =
            await_header(channel, &self.codec, header, &self.config.budget)
                .await;
        match outcome {
            ReadOutcome::Matched(message) => {
                record(&self.sink, LogEvent::Received(&message.raw));
                Ok(message)
            }
            ReadOutcome::Exhausted { target, attempts } => {
                let err = SessionError::ReadExhausted {
                    header: target,
                    attempts,
                };
                tracing::warn!(%target, attempts, "no reply");
                record(&self.sink, LogEvent::Error(&err.to_string()));
                Err(err)
            }
            ReadOutcome::ChannelFailed(err) => Err(self.fail(err).await),
        }
    }

    /// Sends `command` and parses the reply it triggers.
    async fn request<R: Reply>(
        &mut self,
        command: Command,
    ) -> Result<R, SessionError> {
        self.send(command).await?;
        self.receive().await
    }

    /// Waits for and parses the next `R` reply.
    async fn receive<R: Reply>(&mut self) -> Result<R, SessionError> {
        let message = self.await_reply(R::HEADER).await?;
        R::from_message(&message).map_err(|err| {
            let err = SessionError::from(err);
            record(&self.sink, LogEvent::Error(&err.to_string()));
            err
        })
    }

    // =====================================================================
    // Gimbal commands
    // =====================================================================

    /// Enables or disables the motor driver (`SETEN;1` / `SETEN;0`).
    pub async fn set_enable(&mut self, enable: bool) -> Result<(), SessionError> {
        self.send(Command::new(OutboundHeader::SetEnable, enable))
            .await
    }

    /// Sets the rotation direction (`SETDR;1` / `SETDR;0`).
    pub async fn set_direction(
        &mut self,
        forward: bool,
    ) -> Result<(), SessionError> {
        self.send(Command::new(OutboundHeader::SetDirection, forward))
            .await
    }

    /// Moves to `degrees`, rounded to the nearest whole degree (ties to
    /// even), e.g. `90.4` sends `SETPO;90`.
    ///
    /// # Errors
    /// [`SessionError::InvalidCommand`] for NaN, infinite, or input that
    /// does not round into an `i64`; nothing is written. Otherwise as
    /// [`Session::send`].
    pub async fn set_position(
        &mut self,
        degrees: f64,
    ) -> Result<(), SessionError> {
        self.ensure_ready()?;
        let rounded = degrees.round_ties_even();
        // i64::MAX as f64 rounds up to 2^63, hence the exclusive bound.
        if !(rounded >= i64::MIN as f64 && rounded < i64::MAX as f64) {
            return Err(SessionError::InvalidCommand(
                ProtocolError::InvalidPayload(format!(
                    "position {degrees} is not a whole number of degrees in range"
                )),
            ));
        }
        let whole = rounded as i64;
        self.send(Command::new(OutboundHeader::SetPosition, whole))
            .await
    }

    /// Sets the controller setpoint (`SETSP`).
    pub async fn set_setpoint(
        &mut self,
        value: impl Into<Scalar>,
    ) -> Result<(), SessionError> {
        self.send(Command::new(OutboundHeader::SetSetpoint, value))
            .await
    }

    /// Sets the controller deadband (`SETDB`).
    pub async fn set_deadband(
        &mut self,
        value: impl Into<Scalar>,
    ) -> Result<(), SessionError> {
        self.send(Command::new(OutboundHeader::SetDeadband, value))
            .await
    }

    /// Sets one PID gain (`TUNEP` / `TUNEI` / `TUNED`).
    pub async fn tune(
        &mut self,
        gain: Gain,
        value: impl Into<Scalar>,
    ) -> Result<(), SessionError> {
        let header = match gain {
            Gain::Proportional => OutboundHeader::TuneP,
            Gain::Integral => OutboundHeader::TuneI,
            Gain::Derivative => OutboundHeader::TuneD,
        };
        self.send(Command::new(header, value)).await
    }

    /// Triggers gyro calibration (`CALGY;0`). The gimbal must be still.
    pub async fn calibrate_gyro(&mut self) -> Result<(), SessionError> {
        self.send(Command::query(OutboundHeader::CalibrateGyro))
            .await
    }

    /// Queries the firmware version (`GETVE` → `VERS;major,minor`).
    ///
    /// # Errors
    /// [`SessionError::MalformedPayload`] unless the reply has exactly two
    /// tokens. Otherwise as [`Session::send`] and [`Session::await_reply`].
    pub async fn get_version(&mut self) -> Result<Version, SessionError> {
        self.request(Command::query(OutboundHeader::GetVersion))
            .await
    }

    /// Queries the device identity (`GETDN` → `DEVN`).
    pub async fn device_name(&mut self) -> Result<DeviceName, SessionError> {
        self.request(Command::query(OutboundHeader::GetDeviceName))
            .await
    }

    /// Waits for the next `DATA` sample the controller streams.
    pub async fn read_sample(&mut self) -> Result<DataSample, SessionError> {
        self.receive().await
    }
}
