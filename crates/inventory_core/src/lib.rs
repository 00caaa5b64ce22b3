//! Data access and result mapping core for the parts inventory service.
//! HTTP transports call into `service`; everything below it is storage-facing.

pub mod config;
pub mod db;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod outcome;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ConfigResult, StoreConfig};
pub use db::{
    CallOptions, CancelFlag, ConnectionLease, ConnectionProvider, SqliteConnectionProvider,
};
pub use logging::{
    default_log_level, init_logging, logging_status, LogOperationLogger, LoggingError,
    OperationEvent, OperationLogger, RecordingOperationLogger,
};
pub use mapping::{collect_records, map_to_records, QueryResult, Record, ScalarValue};
pub use model::part::{parse_availability, PartId, PartRecord, PART_COLUMNS};
pub use outcome::{ErrorKind, OperationFailure, OperationOutcome};
pub use repo::parts_repo::{PartsCall, PartsRepository};
pub use service::inventory_service::{ApiReply, InventoryService, CONTENT_TYPE_JSON};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
