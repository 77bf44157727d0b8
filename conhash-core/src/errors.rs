//! Any errors that can be encountered when building or mutating a ring

use std::fmt;

use tracing_subscriber::util::TryInitError;

/// Any errors that can be encountered when building or mutating a ring
#[derive(Debug)]
pub enum RingError {
    /// A node spec or node list had an unsupported shape or bad values
    InvalidArgument(String),
    /// A digest function produced too few bytes to derive a ring position
    DigestUnderflow {
        /// The number of bytes the digest produced
        produced: usize,
    },
    /// The ring settings can not be used to build a ring
    InvalidConf(String),
    /// A config parsing error
    Config(config::ConfigError),
    /// A global tracing subscriber was already installed
    Trace(TryInitError),
}

impl RingError {
    /// Build an invalid argument error
    ///
    /// # Arguments
    ///
    /// * `msg` - What was wrong with the argument
    pub(crate) fn invalid<T: Into<String>>(msg: T) -> Self {
        RingError::InvalidArgument(msg.into())
    }
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            RingError::DigestUnderflow { produced } => write!(
                f,
                "digest produced {produced} bytes but at least 4 are required"
            ),
            RingError::InvalidConf(msg) => write!(f, "invalid ring settings: {msg}"),
            RingError::Config(error) => write!(f, "config error: {error}"),
            RingError::Trace(error) => write!(f, "tracing setup failed: {error}"),
        }
    }
}

impl std::error::Error for RingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RingError::Config(error) => Some(error),
            RingError::Trace(error) => Some(error),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for RingError {
    /// Convert this error to our error type
    ///
    /// # Arguments
    ///
    /// * `error` - The error to convert
    fn from(error: config::ConfigError) -> Self {
        RingError::Config(error)
    }
}

impl From<TryInitError> for RingError {
    /// Convert this error to our error type
    ///
    /// # Arguments
    ///
    /// * `error` - The error to convert
    fn from(error: TryInitError) -> Self {
        RingError::Trace(error)
    }
}
