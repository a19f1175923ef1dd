//! A scripted [`Channel`] for tests.
//!
//! [`ScriptedChannel`] replays a queue of read results and records every
//! write. A [`ScriptProbe`] shares the recording, so a test can keep
//! inspecting the channel after a session has taken ownership of it.
//!
//! A responder closure can turn each written line into further read steps,
//! which is enough to stand in for the gimbal firmware:
//!
//! ```rust
//! use gimbal_channel::mock::{ScriptedChannel, Step};
//!
//! let channel = ScriptedChannel::new().respond_with(|line| match line {
//!     "GETDN;0" => vec![Step::line("DEVN;ddc-gimbal")],
//!     _ => Vec::new(),
//! });
//! # let _ = channel;
//! ```

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{Channel, ChannelError};

type Responder = Box<dyn FnMut(&str) -> Vec<Step> + Send>;

/// One scripted result for [`Channel::read_line`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A complete line (without terminator).
    Line(String),
    /// The read times out with no data.
    Silence,
    /// The read fails with an I/O error of this kind.
    Fail(io::ErrorKind),
}

impl Step {
    /// Shorthand for [`Step::Line`].
    pub fn line(text: impl Into<String>) -> Self {
        Self::Line(text.into())
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    writes: Vec<String>,
    reads: usize,
    closes: usize,
    fail_writes: bool,
    fail_close: bool,
}

/// Shared view of a [`ScriptedChannel`]'s activity.
#[derive(Debug, Clone, Default)]
pub struct ScriptProbe {
    inner: Arc<Mutex<ProbeState>>,
}

impl ScriptProbe {
    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every successful write, verbatim (terminators included).
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Number of `read_line` calls made so far.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    /// Number of `close` calls made so far.
    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    /// Makes every following write fail with a broken pipe.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Makes `close` report an error. The channel is still closed and
    /// the call still counted.
    pub fn fail_close(&self, fail: bool) {
        self.lock().fail_close = fail;
    }
}

/// A [`Channel`] driven by a script instead of a device.
///
/// Once the script runs dry, every read times out.
pub struct ScriptedChannel {
    name: String,
    script: VecDeque<Step>,
    responder: Option<Responder>,
    probe: ScriptProbe,
    closed: bool,
}

impl ScriptedChannel {
    /// Creates a channel with an empty script.
    pub fn new() -> Self {
        Self {
            name: "scripted".to_string(),
            script: VecDeque::new(),
            responder: None,
            probe: ScriptProbe::default(),
            closed: false,
        }
    }

    /// Queues one line.
    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.script.push_back(Step::line(text));
        self
    }

    /// Queues several lines in order.
    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script.extend(lines.into_iter().map(Step::line));
        self
    }

    /// Queues `count` timed-out reads.
    pub fn silence(mut self, count: usize) -> Self {
        self.script
            .extend(std::iter::repeat_n(Step::Silence, count));
        self
    }

    /// Queues a failing read.
    pub fn fail_read(mut self, kind: io::ErrorKind) -> Self {
        self.script.push_back(Step::Fail(kind));
        self
    }

    /// Installs a closure that maps each written line (terminator
    /// stripped) to steps appended to the script.
    pub fn respond_with<F>(mut self, responder: F) -> Self
    where
        F: FnMut(&str) -> Vec<Step> + Send + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Returns a probe that observes this channel.
    pub fn probe(&self) -> ScriptProbe {
        self.probe.clone()
    }
}

impl Default for ScriptedChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for ScriptedChannel {
    async fn write(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        let text = String::from_utf8_lossy(data).into_owned();
        {
            let mut probe = self.probe.lock();
            if probe.fail_writes {
                return Err(ChannelError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "scripted write failure",
                )));
            }
            probe.writes.push(text.clone());
        }
        if let Some(responder) = self.responder.as_mut() {
            for line in text.lines().filter(|l| !l.is_empty()) {
                self.script.extend(responder(line));
            }
        }
        Ok(())
    }

    async fn read_line(
        &mut self,
        _timeout: Duration,
    ) -> Result<Option<String>, ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.probe.lock().reads += 1;
        match self.script.pop_front().unwrap_or(Step::Silence) {
            Step::Line(line) => Ok(Some(line)),
            Step::Silence => Ok(None),
            Step::Fail(kind) => Err(ChannelError::Io(io::Error::new(
                kind,
                "scripted read failure",
            ))),
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.closed = true;
        let mut probe = self.probe.lock();
        probe.closes += 1;
        if probe.fail_close {
            return Err(ChannelError::Io(io::Error::other(
                "scripted close failure",
            )));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
