//! File-based configuration.

use std::io;
use std::path::{Path, PathBuf};

use gimbal_session::SessionConfig;
use serde::{Deserialize, Serialize};

/// Everything needed to open and verify a gimbal link.
///
/// Every field has a default, so a config file only lists what differs:
///
/// ```json
/// {
///   "serial": { "path": "/dev/ttyUSB0" },
///   "session": { "boot_settle": { "secs": 2, "nanos": 0 } }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GimbalConfig {
    #[cfg(feature = "serial")]
    pub serial: gimbal_channel::SerialSettings,
    pub session: SessionConfig,
}

/// Errors loading a [`GimbalConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl GimbalConfig {
    /// Loads a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config = serde_json::from_str(&text).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[cfg(feature = "serial")]
    #[test]
    fn test_from_json_file_partial_overrides_keep_defaults() {
        let file = write_temp(
            r#"{
                "serial": { "path": "/dev/ttyUSB0" },
                "session": { "expected_device": "bench", "boot_settle": { "secs": 1, "nanos": 0 } }
            }"#,
        );

        let config = GimbalConfig::from_json_file(file.path()).unwrap();

        assert_eq!(config.serial.path, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.session.expected_device, "bench");
        assert_eq!(config.session.boot_settle, Duration::from_secs(1));
        assert_eq!(config.session.budget.max_attempts, 50);
    }

    #[test]
    fn test_from_json_file_empty_object_is_default() {
        let file = write_temp("{}");
        let config = GimbalConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config, GimbalConfig::default());
    }

    #[test]
    fn test_from_json_file_missing_file_returns_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            GimbalConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_from_json_file_bad_json_returns_parse_error() {
        let file = write_temp("{ \"session\": ");
        let err = GimbalConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
