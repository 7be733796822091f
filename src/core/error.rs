//! Error types for the options scanner

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    /// Malformed numeric or textual input. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A numeric solve (IV inversion, strike bisection) did not converge.
    /// Callers recover by reporting the affected value as undefined.
    #[error("Non-convergent computation: {0}")]
    NonConvergent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ScannerResult<T> = Result<T, ScannerError>;

impl ScannerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn non_convergent(msg: impl Into<String>) -> Self {
        Self::NonConvergent(msg.into())
    }

    /// True for the recoverable "no value available" kind
    pub fn is_non_convergent(&self) -> bool {
        matches!(self, Self::NonConvergent(_))
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Reject NaN and infinities, naming the offending field
pub(crate) fn ensure_finite(name: &str, value: f64) -> ScannerResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScannerError::invalid_input(format!("{} must be finite, got {}", name, value)))
    }
}
