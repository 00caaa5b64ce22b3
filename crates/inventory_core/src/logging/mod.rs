//! Logging bootstrap and operation outcome reporting.
//!
//! # Responsibility
//! - Initialize file-based rolling logs exactly once per process.
//! - Report every data access outcome through an injectable sink.
//!
//! # Invariants
//! - Log lines are `key=value` events carrying metadata, never row data.
//! - Credentials and payload text are never logged.

mod bootstrap;
mod operation;

pub use bootstrap::{default_log_level, init_logging, logging_status, LoggingError};
pub use operation::{
    EventStatus, LogOperationLogger, OperationEvent, OperationLogger, RecordingOperationLogger,
};
