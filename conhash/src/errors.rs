//! The errors that can be returned while building balance reports

use std::fmt;

/// The errors that can be returned while building balance reports
#[derive(Debug)]
pub enum ReportError {
    /// An IO error occured
    IO(std::io::Error),
    /// A report could not be archived or read back
    Rkyv(rkyv::rancor::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::IO(error) => write!(f, "report io error: {error}"),
            ReportError::Rkyv(error) => write!(f, "report archive error: {error}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::IO(error) => Some(error),
            ReportError::Rkyv(error) => Some(error),
        }
    }
}

impl From<std::io::Error> for ReportError {
    /// Convert this error to our error type
    ///
    /// # Arguments
    ///
    /// * `error` - The error to convert
    fn from(error: std::io::Error) -> Self {
        ReportError::IO(error)
    }
}

impl From<rkyv::rancor::Error> for ReportError {
    /// Convert this error to our error type
    ///
    /// # Arguments
    ///
    /// * `error` - The error to convert
    fn from(error: rkyv::rancor::Error) -> Self {
        ReportError::Rkyv(error)
    }
}
