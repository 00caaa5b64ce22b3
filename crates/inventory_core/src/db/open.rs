//! SQLite connection provider.
//!
//! # Responsibility
//! - Open a connection to the configured catalog for each unit of work.
//! - Close connections handed back by leases.
//!
//! # Invariants
//! - The catalog file is never created here; a missing file is a connection failure.
//! - Returned connections have been probed, so an unreadable file fails at acquire.
//! - Credentials are never written to logs.

use super::{CallOptions, ConnectionProvider};
use crate::config::StoreConfig;
use crate::outcome::{OperationFailure, OperationOutcome};
use log::{debug, error, warn};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQL name of the Unicode-aware upper-case function.
///
/// SQLite's built-in `UPPER` folds ASCII letters only.
pub const UNICODE_UPPER: &str = "unicode_upper";

/// Installs the text functions part queries rely on.
pub fn register_text_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        UNICODE_UPPER,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folded = match ctx.get_raw(0) {
                ValueRef::Null => None,
                ValueRef::Integer(value) => Some(value.to_string()),
                ValueRef::Real(value) => Some(value.to_string()),
                ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                    Some(String::from_utf8_lossy(bytes).to_uppercase())
                }
            };
            Ok(folded)
        },
    )
}

/// Opens a fresh SQLite connection per `open` call.
#[derive(Debug, Clone)]
pub struct SqliteConnectionProvider {
    config: StoreConfig,
}

impl SqliteConnectionProvider {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn open_flags() -> OpenFlags {
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
    }

    fn connect(&self, options: &CallOptions) -> Result<Connection, String> {
        if let Some(reason) = options.interrupted() {
            return Err(format!("connection not attempted: {reason}"));
        }
        if !self.config.is_local_host() {
            return Err(format!(
                "host `{}` is unreachable: sqlite catalogs must be local",
                self.config.host
            ));
        }

        let conn = Connection::open_with_flags(&self.config.service, Self::open_flags())
            .map_err(|err| format!("unable to open catalog `{}`: {err}", self.config.service))?;
        conn.busy_timeout(options.remaining_or(DEFAULT_BUSY_TIMEOUT))
            .map_err(|err| err.to_string())?;
        register_text_functions(&conn).map_err(|err| err.to_string())?;

        // SQLite defers file access; read the header now so a bad catalog
        // fails here rather than in the first statement.
        conn.query_row("PRAGMA schema_version;", [], |row| row.get::<_, i64>(0))
            .map_err(|err| format!("catalog `{}` is not readable: {err}", self.config.service))?;

        Ok(conn)
    }
}

impl ConnectionProvider for SqliteConnectionProvider {
    fn open(&self, options: &CallOptions) -> OperationOutcome<Connection> {
        let started_at = Instant::now();

        match self.connect(options) {
            Ok(conn) => {
                debug!(
                    "event=db_acquire module=db status=ok target={} duration_ms={}",
                    self.config.describe(),
                    started_at.elapsed().as_millis()
                );
                Ok(conn)
            }
            Err(detail) => {
                error!(
                    "event=db_acquire module=db status=error target={} duration_ms={} error_kind=connection_error error={}",
                    self.config.describe(),
                    started_at.elapsed().as_millis(),
                    detail
                );
                Err(OperationFailure::connection(detail))
            }
        }
    }

    fn release(&self, conn: Connection) {
        match conn.close() {
            Ok(()) => debug!("event=db_release module=db status=ok"),
            Err((_conn, err)) => warn!(
                "event=db_release module=db status=error error_code=db_close_failed error={}",
                err
            ),
        }
    }
}
