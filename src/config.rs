//! Gate configuration.
//!
//! Stored as a small JSON document with camelCase keys. Keys this crate does
//! not know are ignored, so the same file can also carry the decision
//! service's own settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Well-known path of the decision service socket.
pub const DEFAULT_CHANNEL_PATH: &str = "/run/credential-gate/policy.sock";

/// End-to-end budget for one exchange when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

/// Largest accepted timeout; the host blocks for at most this long.
pub const MAX_TIMEOUT_MS: u64 = 30_000;

/// Settings for a [`PolicyGate`](crate::PolicyGate).
///
/// # Examples
///
/// ```
/// use credential_gate::GateConfig;
///
/// let config = GateConfig::from_json(r#"{"timeoutMs": 800, "failMode": "fail-closed"}"#).unwrap();
/// assert_eq!(config.timeout().as_millis(), 800);
/// assert!(!config.log_username);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GateConfig {
    /// Filesystem path of the decision service socket
    pub channel_path: PathBuf,
    /// Budget for the whole exchange, in milliseconds
    pub timeout_ms: u64,
    /// Whether log events may carry the principal name
    pub log_username: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            channel_path: PathBuf::from(DEFAULT_CHANNEL_PATH),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            log_username: false,
        }
    }
}

impl GateConfig {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid JSON and
    /// [`ConfigError::InvalidTimeout`] for an out-of-range timeout.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: GateConfig = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_json`](Self::from_json).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Loads the file at `path`, falling back to defaults on any error.
    ///
    /// Used on the host path, where a broken configuration must not stop
    /// credential operations.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "using default gate configuration"
                );
                Self::default()
            }
        }
    }

    /// Checks that the timeout is within `1..=MAX_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout {
                timeout_ms: self.timeout_ms,
            });
        }
        Ok(())
    }

    /// Returns the exchange budget as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
