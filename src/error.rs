//! Error types for ean_lookup

use std::time::Duration;

use thiserror::Error;

/// Failure of a single sheet load.
///
/// Reported upward as a value; callers decide whether to surface it or retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// No response arrived within the configured interval
    #[error("Timed out after {:?} waiting for the product sheet", .0)]
    Timeout(Duration),
    /// The request never produced a usable response (DNS, refused, HTTP status)
    #[error("Connection to the product sheet failed: {0}")]
    Connection(String),
    /// The response arrived but lacks the expected table structure
    #[error("Invalid sheet response: {0}")]
    Format(String),
}

impl LoadError {
    /// Short label for logs and API responses
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Timeout(_) => "timeout",
            LoadError::Connection(_) => "connection",
            LoadError::Format(_) => "format",
        }
    }
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            LoadError::Connection(format!("HTTP error: {}", status))
        } else {
            LoadError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Format(format!("payload is not valid JSON: {}", err))
    }
}

/// Failure reported by a barcode scanner collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScannerError {
    #[error("Scanner could not be started: {0}")]
    Start(String),
    #[error("Torch is not supported by this scanner")]
    TorchUnsupported,
    #[error("Torch constraint rejected: {0}")]
    Torch(String),
}

/// Result alias for sheet loads
pub type Result<T> = std::result::Result<T, LoadError>;
