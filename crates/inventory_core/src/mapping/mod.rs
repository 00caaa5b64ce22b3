//! Schema-agnostic conversion of query cursors into JSON-ready records.
//!
//! # Responsibility
//! - Walk any result cursor using only its column metadata.
//! - Coerce native SQLite values into string, integer or null.
//!
//! # Invariants
//! - Column order inside a record equals the statement's projection order.
//! - Record order equals cursor order; nothing is sorted here.
//! - No column is ever dropped; unsupported types become strings.
//! - This module never issues SQL.

mod cursor;
mod record;

pub use cursor::{collect_records, map_to_records, MapError, RecordCursor};
pub use record::{QueryResult, Record, ScalarValue};
