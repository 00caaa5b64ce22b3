//! Injectable sink for data access outcomes.

use super::bootstrap::sanitize_message;
use crate::outcome::{ErrorKind, OperationFailure};
use log::{error, info};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

const MAX_DETAIL_CHARS: usize = 240;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStatus {
    /// `rows` is `None` for writes.
    Ok { rows: Option<usize> },
    Failed { kind: ErrorKind, detail: String },
}

/// One finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEvent {
    pub op_id: Uuid,
    pub operation: &'static str,
    pub duration: Duration,
    pub status: EventStatus,
}

impl OperationEvent {
    pub fn succeeded(
        op_id: Uuid,
        operation: &'static str,
        duration: Duration,
        rows: Option<usize>,
    ) -> Self {
        Self {
            op_id,
            operation,
            duration,
            status: EventStatus::Ok { rows },
        }
    }

    pub fn failed(
        op_id: Uuid,
        operation: &'static str,
        duration: Duration,
        failure: &OperationFailure,
    ) -> Self {
        Self {
            op_id,
            operation,
            duration,
            status: EventStatus::Failed {
                kind: failure.kind,
                detail: failure.detail.clone(),
            },
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.status {
            EventStatus::Ok { .. } => None,
            EventStatus::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Receives exactly one event per data access call.
pub trait OperationLogger: Send + Sync {
    fn record(&self, event: &OperationEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOperationLogger;

impl OperationLogger for LogOperationLogger {
    fn record(&self, event: &OperationEvent) {
        match &event.status {
            EventStatus::Ok { rows } => info!(
                "event=db_operation module=repo operation={} op_id={} status=ok duration_ms={} rows={}",
                event.operation,
                event.op_id,
                event.duration.as_millis(),
                rows.map_or_else(|| "-".to_string(), |count| count.to_string())
            ),
            EventStatus::Failed { kind, detail } => error!(
                "event=db_operation module=repo operation={} op_id={} status=error duration_ms={} error_kind={} error={}",
                event.operation,
                event.op_id,
                event.duration.as_millis(),
                kind,
                sanitize_message(detail, MAX_DETAIL_CHARS)
            ),
        }
    }
}

/// Keeps events in memory for later inspection.
#[derive(Debug, Default)]
pub struct RecordingOperationLogger {
    events: Mutex<Vec<OperationEvent>>,
}

impl RecordingOperationLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OperationEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.events()
            .iter()
            .filter_map(OperationEvent::error_kind)
            .collect()
    }
}

impl OperationLogger for RecordingOperationLogger {
    fn record(&self, event: &OperationEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{OperationEvent, OperationLogger, RecordingOperationLogger};
    use crate::outcome::{ErrorKind, OperationFailure};
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn recording_logger_keeps_events_in_order() {
        let logger = RecordingOperationLogger::new();
        logger.record(&OperationEvent::succeeded(
            Uuid::new_v4(),
            "list_all",
            Duration::from_millis(3),
            Some(2),
        ));
        logger.record(&OperationEvent::failed(
            Uuid::new_v4(),
            "insert_part",
            Duration::from_millis(1),
            &OperationFailure::validation("availability `x` is not an integer"),
        ));

        let events = logger.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].operation, "list_all");
        assert_eq!(logger.error_kinds(), [ErrorKind::ValidationError]);
    }
}
