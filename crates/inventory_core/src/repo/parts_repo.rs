//! Parts data access operations.
//!
//! # Responsibility
//! - Provide the insert, brand lookup, brand+code lookup, list and liveness
//!   operations over `pc_parts`.
//! - Report each call's outcome to the injected `OperationLogger`.
//!
//! # Invariants
//! - Availability is validated before a connection is acquired.
//! - Brand comparison upper-cases both sides at query time; stored text is untouched.
//! - Panics inside an operation surface as `ErrorKind::Unknown` failures.

use crate::db::{
    failure_from_sqlite, CallOptions, ConnectionLease, ConnectionProvider, UNICODE_UPPER,
};
use crate::logging::{LogOperationLogger, OperationEvent, OperationLogger};
use crate::mapping::{collect_records, map_to_records, QueryResult};
use crate::model::part::parse_availability;
use crate::outcome::{OperationFailure, OperationOutcome};
use rusqlite::{params, ToSql};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

const PART_SELECT_SQL: &str = "SELECT
    id,
    title,
    code,
    maker,
    availability,
    description
FROM pc_parts";

const INSERT_PART_SQL: &str = "INSERT INTO pc_parts (
    title,
    code,
    maker,
    availability,
    description
) VALUES (?1, ?2, ?3, ?4, ?5);";

const LIVENESS_SQL: &str = "SELECT strftime('%Y-%m-%d %H:%M:%S', 'now') AS datetime;";

/// Parts operations bound to one connection provider.
///
/// Holds no connection between calls, so a single instance can serve
/// concurrent callers.
pub struct PartsRepository<P: ConnectionProvider> {
    provider: P,
    logger: Arc<dyn OperationLogger>,
}

impl<P: ConnectionProvider> PartsRepository<P> {
    /// Creates a repository that logs outcomes through the `log` facade.
    pub fn new(provider: P) -> Self {
        Self::with_logger(provider, Arc::new(LogOperationLogger))
    }

    pub fn with_logger(provider: P, logger: Arc<dyn OperationLogger>) -> Self {
        Self { provider, logger }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Scopes the next operations to a deadline and/or cancellation flag.
    pub fn call(&self, options: CallOptions) -> PartsCall<'_, P> {
        PartsCall {
            repo: self,
            options,
        }
    }

    /// Inserts one part. The store assigns `id`; it is not returned.
    ///
    /// # Errors
    /// - `ValidationError` when `availability` is not an integer; the store
    ///   is not contacted.
    pub fn insert_part(
        &self,
        title: &str,
        code: &str,
        maker: &str,
        availability: &str,
        description: &str,
    ) -> OperationOutcome<()> {
        self.call(CallOptions::default())
            .insert_part(title, code, maker, availability, description)
    }

    /// Parts whose maker equals `brand`, ignoring case.
    pub fn find_by_brand(&self, brand: &str) -> OperationOutcome<QueryResult> {
        self.call(CallOptions::default()).find_by_brand(brand)
    }

    /// Parts whose maker equals `brand` (ignoring case) and whose code equals `code`.
    pub fn find_by_brand_and_code(&self, brand: &str, code: i64) -> OperationOutcome<QueryResult> {
        self.call(CallOptions::default())
            .find_by_brand_and_code(brand, code)
    }

    /// Every part in store order.
    pub fn list_all(&self) -> OperationOutcome<QueryResult> {
        self.call(CallOptions::default()).list_all()
    }

    /// One row holding the store's current time as `YYYY-MM-DD HH:MM:SS`.
    pub fn check_liveness(&self) -> OperationOutcome<QueryResult> {
        self.call(CallOptions::default()).check_liveness()
    }
}

/// Operations sharing one set of call options.
pub struct PartsCall<'r, P: ConnectionProvider> {
    repo: &'r PartsRepository<P>,
    options: CallOptions,
}

impl<P: ConnectionProvider> PartsCall<'_, P> {
    pub fn insert_part(
        &self,
        title: &str,
        code: &str,
        maker: &str,
        availability: &str,
        description: &str,
    ) -> OperationOutcome<()> {
        self.run("insert_part", |_: &()| None, || {
            let availability = parse_availability(availability)
                .map_err(|err| OperationFailure::validation(err.to_string()))?;

            let conn = self.acquire()?;
            self.ensure_active()?;
            conn.execute(
                INSERT_PART_SQL,
                params![title, code, maker, availability, description],
            )
            .map_err(failure_from_sqlite)?;
            Ok(())
        })
    }

    pub fn find_by_brand(&self, brand: &str) -> OperationOutcome<QueryResult> {
        let brand = normalize_brand(brand);
        self.run("find_by_brand", row_count, || {
            self.query(
                &format!("{PART_SELECT_SQL} WHERE {UNICODE_UPPER}(maker) = ?1;"),
                params![brand],
            )
        })
    }

    pub fn find_by_brand_and_code(&self, brand: &str, code: i64) -> OperationOutcome<QueryResult> {
        let brand = normalize_brand(brand);
        self.run("find_by_brand_and_code", row_count, || {
            self.query(
                &format!("{PART_SELECT_SQL} WHERE {UNICODE_UPPER}(maker) = ?1 AND code = ?2;"),
                params![brand, code],
            )
        })
    }

    pub fn list_all(&self) -> OperationOutcome<QueryResult> {
        self.run("list_all", row_count, || {
            self.query(&format!("{PART_SELECT_SQL};"), params![])
        })
    }

    pub fn check_liveness(&self) -> OperationOutcome<QueryResult> {
        self.run("check_liveness", row_count, || {
            self.query(LIVENESS_SQL, params![])
        })
    }

    fn acquire(&self) -> OperationOutcome<ConnectionLease<'_>> {
        ConnectionLease::acquire(&self.repo.provider, &self.options)
    }

    fn ensure_active(&self) -> OperationOutcome<()> {
        match self.options.interrupted() {
            Some(reason) => Err(OperationFailure::execution(format!(
                "operation abandoned: {reason}"
            ))),
            None => Ok(()),
        }
    }

    fn query(&self, sql: &str, params: &[&dyn ToSql]) -> OperationOutcome<QueryResult> {
        let conn = self.acquire()?;
        self.ensure_active()?;

        let mut stmt = conn.prepare(sql).map_err(failure_from_sqlite)?;
        let rows = stmt.query(params).map_err(failure_from_sqlite)?;
        let records = collect_records(map_to_records(rows).with_options(self.options.clone()))?;
        Ok(records)
    }

    /// Runs one operation body as the failure boundary: catches panics,
    /// times the call and emits exactly one outcome event.
    fn run<T>(
        &self,
        operation: &'static str,
        rows: fn(&T) -> Option<usize>,
        body: impl FnOnce() -> OperationOutcome<T>,
    ) -> OperationOutcome<T> {
        let op_id = Uuid::new_v4();
        let started_at = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|payload| {
            Err(OperationFailure::unknown(format!(
                "operation panicked: {}",
                panic_text(&*payload)
            )))
        });

        let event = match &outcome {
            Ok(value) => {
                OperationEvent::succeeded(op_id, operation, started_at.elapsed(), rows(value))
            }
            Err(failure) => {
                OperationEvent::failed(op_id, operation, started_at.elapsed(), failure)
            }
        };
        self.repo.logger.record(&event);

        outcome
    }
}

fn row_count(result: &QueryResult) -> Option<usize> {
    Some(result.len())
}

/// Folds the same way as `UNICODE_UPPER` does on the stored side.
fn normalize_brand(brand: &str) -> String {
    brand.to_uppercase()
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
