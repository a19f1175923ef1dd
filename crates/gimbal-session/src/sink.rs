//! Diagnostic log sink for wire traffic.
//!
//! The session reports every line it sends, every reply it accepts, and
//! every error it surfaces to a [`LogSink`] handed to it at construction.
//! Sinks are best-effort: a failing sink never stops protocol progress.

use std::io;
use std::sync::Arc;

/// One wire-level event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEvent<'a> {
    /// A line written to the channel (terminator stripped).
    Sent(&'a str),
    /// A reply line accepted by the session.
    Received(&'a str),
    /// An error about to be returned to the caller.
    Error(&'a str),
}

/// Receives [`LogEvent`]s from a session.
///
/// Errors returned from [`LogSink::record`] are swallowed by the session.
pub trait LogSink: Send + Sync + 'static {
    fn record(&self, event: &LogEvent<'_>) -> io::Result<()>;
}

/// Forwards events to `tracing` under the `gimbal::wire` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, event: &LogEvent<'_>) -> io::Result<()> {
        match event {
            LogEvent::Sent(line) => {
                tracing::info!(target: "gimbal::wire", "SENT:{line}");
            }
            LogEvent::Received(line) => {
                tracing::info!(target: "gimbal::wire", "RECV:{line}");
            }
            LogEvent::Error(message) => {
                tracing::error!(target: "gimbal::wire", "{message}");
            }
        }
        Ok(())
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _event: &LogEvent<'_>) -> io::Result<()> {
        Ok(())
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn record(&self, event: &LogEvent<'_>) -> io::Result<()> {
        (**self).record(event)
    }
}

/// Records `event`, swallowing sink failures.
pub(crate) fn record<L: LogSink>(sink: &L, event: LogEvent<'_>) {
    if let Err(err) = sink.record(&event) {
        tracing::debug!(error = %err, "log sink failed; event dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl LogSink for BrokenSink {
        fn record(&self, _event: &LogEvent<'_>) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_record_swallows_sink_errors() {
        // Must not panic or propagate.
        record(&BrokenSink, LogEvent::Sent("SETEN;1"));
    }

    #[test]
    fn test_builtin_sinks_accept_all_events() {
        for event in [
            LogEvent::Sent("SETPO;90"),
            LogEvent::Received("VERS;1,3"),
            LogEvent::Error("boom"),
        ] {
            assert!(TracingSink.record(&event).is_ok());
            assert!(NullSink.record(&event).is_ok());
            assert!(Arc::new(NullSink).record(&event).is_ok());
        }
    }
}
