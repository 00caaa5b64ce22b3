//! Lazy cursor walk producing `Record`s.

use super::record::{QueryResult, Record, ScalarValue};
use crate::db::{classify_sqlite_error, CallOptions};
use crate::outcome::{ErrorKind, OperationFailure};
use rusqlite::types::ValueRef;
use rusqlite::Rows;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[derive(Debug)]
pub enum MapError {
    Sqlite(rusqlite::Error),
    InvalidText { column: String },
    Interrupted(&'static str),
}

impl Display for MapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidText { column } => {
                write!(f, "column `{column}` holds text that is not valid UTF-8")
            }
            Self::Interrupted(reason) => write!(f, "result walk stopped: {reason}"),
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidText { .. } | Self::Interrupted(_) => None,
        }
    }
}

impl From<rusqlite::Error> for MapError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<MapError> for OperationFailure {
    fn from(value: MapError) -> Self {
        let kind = match &value {
            MapError::Sqlite(err) => classify_sqlite_error(err),
            MapError::InvalidText { .. } | MapError::Interrupted(_) => ErrorKind::ExecutionError,
        };
        OperationFailure::new(kind, value.to_string())
    }
}

/// Forward-only sequence of records over a live cursor.
///
/// Yields at most one error, after which the sequence ends.
pub struct RecordCursor<'stmt> {
    rows: Rows<'stmt>,
    columns: Arc<[String]>,
    options: CallOptions,
    finished: bool,
}

impl RecordCursor<'_> {
    /// Checks the deadline and cancellation hook between rows.
    pub fn with_options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Column names in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    fn fail(&mut self, err: MapError) -> Option<Result<Record, MapError>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl Iterator for RecordCursor<'_> {
    type Item = Result<Record, MapError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Some(reason) = self.options.interrupted() {
            return self.fail(MapError::Interrupted(reason));
        }

        let mapped = match self.rows.next() {
            Ok(Some(row)) => record_from_row(row, &self.columns),
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(err) => Err(MapError::Sqlite(err)),
        };

        match mapped {
            Ok(record) => Some(Ok(record)),
            Err(err) => self.fail(err),
        }
    }
}

/// Wraps a cursor, reading its column metadata once.
pub fn map_to_records(rows: Rows<'_>) -> RecordCursor<'_> {
    let columns: Arc<[String]> = rows
        .as_ref()
        .map(|stmt| {
            stmt.column_names()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
        .into();

    RecordCursor {
        rows,
        columns,
        options: CallOptions::default(),
        finished: false,
    }
}

/// Drains a cursor into a `QueryResult`.
pub fn collect_records(cursor: RecordCursor<'_>) -> Result<QueryResult, MapError> {
    let records = cursor.collect::<Result<Vec<_>, _>>()?;
    Ok(QueryResult::new(records))
}

fn record_from_row(row: &rusqlite::Row<'_>, columns: &Arc<[String]>) -> Result<Record, MapError> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, column) in columns.iter().enumerate() {
        values.push(coerce_value(row.get_ref(idx)?, column)?);
    }
    Ok(Record::new(Arc::clone(columns), values))
}

fn coerce_value(value: ValueRef<'_>, column: &str) -> Result<ScalarValue, MapError> {
    match value {
        ValueRef::Null => Ok(ScalarValue::Null),
        ValueRef::Integer(value) => Ok(ScalarValue::Integer(value)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| ScalarValue::Text(text.to_string()))
            .map_err(|_| MapError::InvalidText {
                column: column.to_string(),
            }),
        ValueRef::Real(value) => Ok(ScalarValue::Text(value.to_string())),
        ValueRef::Blob(bytes) => Ok(ScalarValue::Text(hex::encode(bytes))),
    }
}

#[cfg(test)]
mod tests {
    use super::{collect_records, map_to_records, MapError};
    use crate::db::{CallOptions, CancelFlag};
    use crate::mapping::ScalarValue;
    use rusqlite::Connection;

    fn fixture() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE gadgets (a INTEGER, b TEXT, c REAL, d BLOB, e TEXT);
             INSERT INTO gadgets VALUES (1, 'one', 1.5, x'0aff', NULL);
             INSERT INTO gadgets VALUES (2, 'two', 2.25, x'00', 'set');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn columns_follow_projection_not_table_order() {
        let conn = fixture();
        let mut stmt = conn.prepare("SELECT e, c, a FROM gadgets").unwrap();
        let cursor = map_to_records(stmt.query([]).unwrap());
        assert_eq!(cursor.columns(), ["e", "c", "a"]);

        let result = collect_records(cursor).unwrap();
        for record in &result {
            assert_eq!(record.column_names().collect::<Vec<_>>(), ["e", "c", "a"]);
        }
    }

    #[test]
    fn coerces_every_storage_class() {
        let conn = fixture();
        let mut stmt = conn
            .prepare("SELECT a, b, c, d, e FROM gadgets WHERE a = 1")
            .unwrap();
        let result = collect_records(map_to_records(stmt.query([]).unwrap())).unwrap();

        let record = &result.records()[0];
        assert_eq!(record.get("a"), Some(&ScalarValue::Integer(1)));
        assert_eq!(record.get("b"), Some(&ScalarValue::Text("one".to_string())));
        assert_eq!(record.get("c"), Some(&ScalarValue::Text("1.5".to_string())));
        assert_eq!(record.get("d"), Some(&ScalarValue::Text("0aff".to_string())));
        assert_eq!(record.get("e"), Some(&ScalarValue::Null));
    }

    #[test]
    fn preserves_cursor_order() {
        let conn = fixture();
        let mut stmt = conn.prepare("SELECT a FROM gadgets ORDER BY a DESC").unwrap();
        let result = collect_records(map_to_records(stmt.query([]).unwrap())).unwrap();
        let values: Vec<_> = result
            .iter()
            .filter_map(|record| record.get("a").and_then(ScalarValue::as_i64))
            .collect();
        assert_eq!(values, [2, 1]);
    }

    #[test]
    fn empty_cursor_yields_empty_result() {
        let conn = fixture();
        let mut stmt = conn.prepare("SELECT a FROM gadgets WHERE a > 100").unwrap();
        let result = collect_records(map_to_records(stmt.query([]).unwrap())).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn cursor_is_lazy_and_single_pass() {
        let conn = fixture();
        let mut stmt = conn.prepare("SELECT a FROM gadgets").unwrap();
        let mut cursor = map_to_records(stmt.query([]).unwrap());
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().unwrap().is_ok());
        assert!(cursor.next().is_none());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn cancellation_stops_the_walk() {
        let conn = fixture();
        let mut stmt = conn.prepare("SELECT a FROM gadgets").unwrap();
        let flag = CancelFlag::new();
        let mut cursor = map_to_records(stmt.query([]).unwrap())
            .with_options(CallOptions::default().with_cancel(flag.clone()));

        assert!(cursor.next().unwrap().is_ok());
        flag.cancel();
        assert!(matches!(
            cursor.next(),
            Some(Err(MapError::Interrupted("cancelled")))
        ));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn table_free_projection_maps_like_any_other() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT 'x' AS label, 42 AS answer").unwrap();
        let result = collect_records(map_to_records(stmt.query([]).unwrap())).unwrap();
        assert_eq!(
            result.to_json_string().unwrap(),
            r#"[{"label":"x","answer":42}]"#
        );
    }
}
