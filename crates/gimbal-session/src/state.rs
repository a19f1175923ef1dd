//! Session configuration and lifecycle state.

use std::fmt;
use std::time::Duration;

use gimbal_protocol::{RetryBudget, DEFAULT_DELIMITER};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`Session`](crate::Session).
///
/// The timing values are tied to the gimbal hardware, not to the protocol:
/// the controller resets when the serial port opens and needs a few seconds
/// before it answers anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Header/payload delimiter on the wire.
    pub delimiter: char,

    /// Wait between taking the channel and the first byte sent.
    ///
    /// Default: 3 seconds (microcontroller reset-on-connect).
    pub boot_settle: Duration,

    /// Identity the `DEVN` reply must carry.
    pub expected_device: String,

    /// Read limits for every reply the session waits for.
    pub budget: RetryBudget,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            boot_settle: Duration::from_secs(3),
            expected_device: "ddc-gimbal".to_string(),
            budget: RetryBudget::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle state of a [`Session`](crate::Session).
///
/// ```text
///   Disconnected ──connect──→ Connecting ──GETDN sent──→ Identifying
///        ↑                                                   │
///        │                                  identity ok ─────┤──── otherwise
///        │                                        ▼          ▼
///        └──────────disconnect────────────── Ready ──────→ Failed
///                                                channel error
/// ```
///
/// `connect` may be called again from `Failed` or `Disconnected`; it always
/// starts from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No channel held.
    Disconnected,
    /// Channel held, waiting for the controller to boot.
    Connecting,
    /// Identity query sent, waiting for the reply.
    Identifying,
    /// Handshake passed; commands are accepted.
    Ready,
    /// Handshake or channel failure; the channel has been released.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Identifying => "identifying",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Which PID gain a `TUNE*` command sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gain {
    Proportional,
    Integral,
    Derivative,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.boot_settle, Duration::from_secs(3));
        assert_eq!(config.expected_device, "ddc-gimbal");
        assert_eq!(config.budget.max_attempts, 50);
    }

    #[test]
    fn test_session_config_from_partial_json() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "expected_device": "bench-gimbal", "budget": { "max_attempts": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.expected_device, "bench-gimbal");
        assert_eq!(config.budget.max_attempts, 5);
        assert_eq!(config.boot_settle, Duration::from_secs(3));
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!(SessionState::Failed.to_string(), "failed");
    }
}
