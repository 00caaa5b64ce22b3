//! Connection acquisition and release for the parts store.
//!
//! # Responsibility
//! - Hand out one independent SQLite connection per unit of work.
//! - Guarantee the connection goes back to its provider exactly once.
//! - Classify driver failures into operation error kinds.
//!
//! # Invariants
//! - No connection outlives the operation that acquired it.
//! - Providers hold configuration only, never a live connection.
//! - Schema provisioning is not performed here.

use crate::outcome::{ErrorKind, OperationFailure, OperationOutcome};
use rusqlite::{Connection, ErrorCode};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod open;

pub use open::{register_text_functions, SqliteConnectionProvider, UNICODE_UPPER};

/// Source of connections for data access operations.
///
/// Implementations must be shareable across threads: every call to `open`
/// returns a fresh connection and no state is kept between calls. Returned
/// connections must carry the functions installed by `register_text_functions`.
pub trait ConnectionProvider: Send + Sync {
    /// Opens a connection bound to the configured target.
    ///
    /// Every failure is reported as `ErrorKind::ConnectionError`.
    fn open(&self, options: &CallOptions) -> OperationOutcome<Connection>;

    /// Closes a connection previously returned by `open`.
    fn release(&self, conn: Connection);
}

/// Connection on loan from a provider for the duration of one operation.
///
/// Dropping the lease releases the connection. Release happens exactly once
/// regardless of how the owning scope is left.
pub struct ConnectionLease<'p> {
    conn: Option<Connection>,
    provider: &'p dyn ConnectionProvider,
}

impl<'p> ConnectionLease<'p> {
    pub fn acquire(
        provider: &'p dyn ConnectionProvider,
        options: &CallOptions,
    ) -> OperationOutcome<Self> {
        let conn = provider.open(options)?;
        Ok(Self {
            conn: Some(conn),
            provider,
        })
    }
}

impl Deref for ConnectionLease<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // `conn` is only taken in `drop`.
        self.conn
            .as_ref()
            .unwrap_or_else(|| unreachable!("connection lease used after release"))
    }
}

impl Drop for ConnectionLease<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.provider.release(conn);
        }
    }
}

/// Shared flag a caller flips to abandon in-flight operations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call deadline and cancellation hook.
///
/// The default carries neither, so operations run to completion.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelFlag>,
}

impl CallOptions {
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns why the call must stop, if it must.
    pub fn interrupted(&self) -> Option<&'static str> {
        if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
            return Some("cancelled");
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some("deadline exceeded"),
            _ => None,
        }
    }

    /// Time left before the deadline, capped at `fallback`.
    pub fn remaining_or(&self, fallback: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(fallback),
            None => fallback,
        }
    }
}

/// Maps a driver failure onto an operation error kind.
///
/// Failures to reach, lock or read the database file are connection problems;
/// everything the engine reports about a statement is an execution problem.
pub fn classify_sqlite_error(err: &rusqlite::Error) -> ErrorKind {
    match err {
        rusqlite::Error::SqliteFailure(inner, _) => match inner.code {
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::PermissionDenied
            | ErrorCode::SystemIoFailure
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::NotFound => ErrorKind::ConnectionError,
            _ => ErrorKind::ExecutionError,
        },
        rusqlite::Error::InvalidPath(_) => ErrorKind::ConnectionError,
        rusqlite::Error::SqliteSingleThreadedMode => ErrorKind::ConnectionError,
        rusqlite::Error::InvalidParameterCount(_, _)
        | rusqlite::Error::InvalidParameterName(_)
        | rusqlite::Error::InvalidColumnIndex(_)
        | rusqlite::Error::InvalidColumnName(_)
        | rusqlite::Error::InvalidColumnType(_, _, _)
        | rusqlite::Error::FromSqlConversionFailure(_, _, _)
        | rusqlite::Error::IntegralValueOutOfRange(_, _)
        | rusqlite::Error::ToSqlConversionFailure(_)
        | rusqlite::Error::Utf8Error(_)
        | rusqlite::Error::NulError(_)
        | rusqlite::Error::ExecuteReturnedResults
        | rusqlite::Error::QueryReturnedNoRows => ErrorKind::ExecutionError,
        _ => ErrorKind::Unknown,
    }
}

/// Converts a driver failure into an operation failure, keeping its message.
pub fn failure_from_sqlite(err: rusqlite::Error) -> OperationFailure {
    OperationFailure::new(classify_sqlite_error(&err), err.to_string())
}
