//! Serial port channel implementation using `serialport`.
//!
//! `serialport` is a blocking API, so every port operation runs on Tokio's
//! blocking pool. The port (plus any partially received line) sits behind a
//! shared lock that the blocking task holds for one operation. If the
//! calling future is dropped mid-read, the task still finishes and releases
//! the lock, so the channel stays usable; a line completed by that orphaned
//! read is lost.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serialport::SerialPort;

use crate::{take_line, Channel, ChannelError};

/// Settings used to open a serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path (`/dev/ttyACM0`, `COM3`, ...).
    pub path: String,

    /// Line speed. The gimbal firmware runs at 115200 baud.
    pub baud_rate: u32,

    /// How long a single write may block before it is reported as
    /// [`ChannelError::WriteTimeout`].
    pub write_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            path: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
            write_timeout: Duration::from_millis(50),
        }
    }
}

struct PortState {
    port: Box<dyn SerialPort>,
    /// Bytes received after the last complete line.
    pending: Vec<u8>,
}

/// A [`Channel`] over a serial port.
pub struct SerialChannel {
    name: String,
    write_timeout: Duration,
    /// `None` once closed.
    state: Option<Arc<Mutex<PortState>>>,
}

impl SerialChannel {
    /// Opens and configures the port described by `settings`.
    pub fn open(settings: &SerialSettings) -> Result<Self, ChannelError> {
        let port = serialport::new(settings.path.as_str(), settings.baud_rate)
            .timeout(settings.write_timeout)
            .open()
            .map_err(|e| map_open_error(&settings.path, e))?;
        tracing::info!(
            port = %settings.path,
            baud = settings.baud_rate,
            "serial port opened"
        );
        Ok(Self::from_port(port, settings.write_timeout))
    }

    /// Wraps a port that was opened elsewhere.
    pub fn from_port(port: Box<dyn SerialPort>, write_timeout: Duration) -> Self {
        let name = port.name().unwrap_or_else(|| "serial".to_string());
        Self {
            name,
            write_timeout,
            state: Some(Arc::new(Mutex::new(PortState {
                port,
                pending: Vec::new(),
            }))),
        }
    }

    /// Runs `f` against the port on the blocking pool.
    async fn run_blocking<T, F>(&mut self, f: F) -> Result<T, ChannelError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PortState) -> Result<T, ChannelError> + Send + 'static,
    {
        let state = self.state.clone().ok_or(ChannelError::Closed)?;
        tokio::task::spawn_blocking(move || {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        })
        .await
        .map_err(|e| ChannelError::Serial(format!("port task failed: {e}")))?
    }
}

impl Channel for SerialChannel {
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        let data = data.to_vec();
        let timeout = self.write_timeout;
        self.run_blocking(move |state| {
            state.port.set_timeout(timeout).map_err(map_port_error)?;
            state.port.write_all(&data).map_err(map_write_error)?;
            state.port.flush().map_err(map_write_error)
        })
        .await
    }

    async fn read_line(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<String>, ChannelError> {
        self.run_blocking(move |state| read_line_blocking(state, timeout))
            .await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        // The port closes when the last holder of the state drops it,
        // which may be an orphaned blocking read.
        if self.state.take().is_some() {
            tracing::debug!(port = %self.name, "serial port closed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reads until a full line is buffered or `timeout` elapses.
///
/// A partial line that is still incomplete at the deadline stays in the
/// pending buffer and is completed by a later read.
fn read_line_blocking(
    state: &mut PortState,
    timeout: Duration,
) -> Result<Option<String>, ChannelError> {
    if let Some(line) = take_line(&mut state.pending) {
        return Ok(Some(line));
    }

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; 64];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        state.port.set_timeout(remaining).map_err(map_port_error)?;
        match state.port.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(n) => {
                state.pending.extend_from_slice(&buf[..n]);
                if let Some(line) = take_line(&mut state.pending) {
                    return Ok(Some(line));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ChannelError::Io(e)),
        }
    }
}

fn map_write_error(err: io::Error) -> ChannelError {
    if err.kind() == io::ErrorKind::TimedOut {
        ChannelError::WriteTimeout
    } else {
        ChannelError::Io(err)
    }
}

fn map_port_error(err: serialport::Error) -> ChannelError {
    match err.kind() {
        serialport::ErrorKind::Io(kind) => {
            ChannelError::Io(io::Error::new(kind, err.description))
        }
        _ => ChannelError::Serial(err.to_string()),
    }
}

fn map_open_error(path: &str, err: serialport::Error) -> ChannelError {
    match err.kind() {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => {
            ChannelError::NotFound(format!("{path}: {err}"))
        }
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ChannelError::PermissionDenied(format!("{path}: {err}"))
        }
        _ => ChannelError::Serial(format!("{path}: {err}")),
    }
}
