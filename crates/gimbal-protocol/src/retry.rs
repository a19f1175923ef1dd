//! The read-retry engine: wait for one kind of reply on a noisy stream.
//!
//! The gimbal interleaves asynchronous telemetry (`DATA`, `LOOP`, `WARN`)
//! with command replies, and a silent or rebooting controller produces
//! timed-out reads. [`await_header`] skips everything that is not the
//! wanted reply, but only for a bounded number of reads.

use std::time::Duration;

use gimbal_channel::{Channel, ChannelError};
use serde::{Deserialize, Serialize};

use crate::{Header, InboundHeader, LineCodec, Message, ProtocolError};

/// Limits for a single [`await_header`] call.
///
/// Worst-case wait is roughly `max_attempts × read_timeout` plus a
/// `settle_delay` after every timed-out read. The defaults were chosen
/// for the gimbal firmware's output rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryBudget {
    /// Reads allowed (empty or non-matching) before giving up.
    pub max_attempts: u32,

    /// Pause after a read that returned nothing.
    pub settle_delay: Duration,

    /// Timeout passed to each [`Channel::read_line`].
    pub read_timeout: Duration,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            settle_delay: Duration::from_millis(50),
            read_timeout: Duration::from_millis(500),
        }
    }
}

/// How an [`await_header`] call ended.
#[derive(Debug)]
pub enum ReadOutcome {
    /// A line with the target header arrived.
    Matched(Message),

    /// Every attempt in the budget was used without a match.
    Exhausted {
        target: InboundHeader,
        attempts: u32,
    },

    /// The channel failed. No further reads were made.
    ChannelFailed(ChannelError),
}

impl ReadOutcome {
    /// Converts the outcome into a `Result`.
    ///
    /// # Errors
    /// [`ProtocolError::ReadExhausted`] or [`ProtocolError::Channel`].
    pub fn into_result(self) -> Result<Message, ProtocolError> {
        match self {
            Self::Matched(message) => Ok(message),
            Self::Exhausted { target, attempts } => {
                Err(ProtocolError::ReadExhausted {
                    header: target,
                    attempts,
                })
            }
            Self::ChannelFailed(err) => Err(ProtocolError::Channel(err)),
        }
    }
}

/// Reads from `channel` until a line with header `target` arrives.
///
/// Each completed read costs one attempt, whether it timed out, was
/// blank, failed to decode, or carried a different header. Undecodable
/// lines are noise here, not errors. A channel error ends the call at once
/// without touching the budget.
pub async fn await_header<C: Channel>(
    channel: &mut C,
    codec: &LineCodec,
    target: InboundHeader,
    budget: &RetryBudget,
) -> ReadOutcome {
    let mut attempts = 0;
    while attempts < budget.max_attempts {
        let line = match channel.read_line(budget.read_timeout).await {
            Ok(line) => line,
            Err(err) => {
                tracing::debug!(port = %channel.name(), %target, error = %err, "read failed");
                return ReadOutcome::ChannelFailed(err);
            }
        };
        attempts += 1;

        let decoded = match line.as_deref().map(|raw| codec.decode(raw)) {
            None | Some(Ok(None)) => None,
            Some(Ok(Some(message))) => Some(message),
            Some(Err(err)) => {
                tracing::trace!(%target, attempts, error = %err, "skipping undecodable line");
                continue;
            }
        };

        match decoded {
            Some(message) if message.header == Header::Inbound(target) => {
                return ReadOutcome::Matched(message);
            }
            Some(message) => {
                tracing::trace!(%target, attempts, line = %message.raw, "skipping unrelated line");
            }
            None => {
                tracing::trace!(%target, attempts, "empty read");
                if attempts < budget.max_attempts {
                    tokio::time::sleep(budget.settle_delay).await;
                }
            }
        }
    }

    tracing::debug!(%target, attempts, "retry budget exhausted");
    ReadOutcome::Exhausted { target, attempts }
}
