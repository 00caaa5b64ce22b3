//! Failure taxonomy shared by every data access operation.
//!
//! # Responsibility
//! - Classify raw failures into a small, stable set of kinds.
//! - Map kinds onto transport status codes for the API adapter.
//!
//! # Invariants
//! - `OperationFailure` is the only error type that leaves the data access layer.
//! - `detail` is diagnostic text; callers facing end users use `public_message`.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tagged result of a data access operation.
pub type OperationOutcome<T> = Result<T, OperationFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller data failed a pre-execution check. The store was not touched.
    ValidationError,
    /// Acquiring or using a connection failed.
    ConnectionError,
    /// The store rejected or failed a well-formed statement.
    ExecutionError,
    /// Anything else captured at the operation boundary.
    Unknown,
}

impl ErrorKind {
    /// Stable identifier used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::ConnectionError => "connection_error",
            Self::ExecutionError => "execution_error",
            Self::Unknown => "unknown",
        }
    }

    /// HTTP status the API adapter answers with.
    pub fn http_status(self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::ConnectionError => 503,
            Self::ExecutionError | Self::Unknown => 500,
        }
    }

    /// Generic message safe to show to a client.
    pub fn public_message(self) -> &'static str {
        match self {
            Self::ValidationError => "Request data is invalid",
            Self::ConnectionError => "Service is temporarily unavailable",
            Self::ExecutionError | Self::Unknown => {
                "Server was not able to process your request"
            }
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure carrying diagnostic detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl OperationFailure {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, detail)
    }

    pub fn connection(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, detail)
    }

    pub fn execution(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExecutionError, detail)
    }

    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, detail)
    }
}

impl Display for OperationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl Error for OperationFailure {}
