use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors surfaced by the crate's fallible entry points.
///
/// None of these reach the host subsystem: the gate folds every failure into
/// an allow decision. They exist for configuration loading and tooling.
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Failure to load or validate a [`GateConfig`](crate::GateConfig).
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
    /// The configuration text is not valid JSON for the expected shape
    ///
    /// Displayed by position only: the parser's own message can quote values
    /// from the file.
    Parse(serde_json::Error),
    /// The timeout is outside the accepted range
    InvalidTimeout {
        /// The rejected value in milliseconds
        timeout_ms: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            ConfigError::Parse(e) => write!(
                f,
                "invalid configuration ({}) at line {}, column {}",
                parse_category(e),
                e.line(),
                e.column()
            ),
            ConfigError::InvalidTimeout { timeout_ms } => write!(
                f,
                "timeoutMs must be between 1 and {} (got {})",
                crate::config::MAX_TIMEOUT_MS,
                timeout_ms
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::InvalidTimeout { .. } => None,
        }
    }
}

fn parse_category(e: &serde_json::Error) -> &'static str {
    match e.classify() {
        serde_json::error::Category::Io => "unreadable",
        serde_json::error::Category::Syntax => "syntax error",
        serde_json::error::Category::Data => "unexpected value",
        serde_json::error::Category::Eof => "unexpected end of input",
    }
}

/// Failure to serialize a credential event.
///
/// Deliberately carries no detail from the serializer: its message could
/// quote the value being written.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodeError {
    _private: (),
}

impl EncodeError {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("credential event could not be serialized")
    }
}

impl std::error::Error for EncodeError {}
