//! Part record model.
//!
//! # Responsibility
//! - Name the `pc_parts` projection.
//! - Parse availability text into the stored integer.
//! - Offer a typed view over mapped records of the standard projection.
//!
//! # Invariants
//! - `PART_COLUMNS` order is the projection order of every part query.
//! - Availability parsing never trims or rounds its input.

use crate::mapping::{Record, ScalarValue};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned surrogate key.
pub type PartId = i64;

/// Projection shared by every part query.
pub const PART_COLUMNS: [&str; 6] = [
    "id",
    "title",
    "code",
    "maker",
    "availability",
    "description",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValidationError {
    /// Availability text is not a base-10 integer.
    InvalidAvailability(String),
}

impl Display for PartValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAvailability(value) => {
                write!(f, "availability `{value}` is not an integer")
            }
        }
    }
}

impl Error for PartValidationError {}

/// Parses caller-supplied availability text.
///
/// Accepts an optional sign followed by digits, nothing else.
pub fn parse_availability(value: &str) -> Result<i64, PartValidationError> {
    value
        .parse::<i64>()
        .map_err(|_| PartValidationError::InvalidAvailability(value.to_string()))
}

/// Persisted part, read back through the standard projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: PartId,
    pub title: String,
    pub code: String,
    pub maker: String,
    pub availability: i64,
    /// Descriptions are optional in the table.
    pub description: Option<String>,
}

impl PartRecord {
    /// Reads a mapped record of the standard projection.
    ///
    /// Returns `None` when a required column is absent or has the wrong type.
    pub fn from_record(record: &Record) -> Option<Self> {
        let text = |column: &str| record.get(column)?.as_str().map(str::to_string);

        let description = match record.get("description")? {
            ScalarValue::Null => None,
            ScalarValue::Text(value) => Some(value.clone()),
            ScalarValue::Integer(value) => Some(value.to_string()),
        };

        Some(Self {
            id: record.get("id")?.as_i64()?,
            title: text("title")?,
            code: text("code")?,
            maker: text("maker")?,
            availability: record.get("availability")?.as_i64()?,
            description,
        })
    }
}
