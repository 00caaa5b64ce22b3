use inventory_core::{
    CallOptions, CancelFlag, ConnectionProvider, ErrorKind, OperationOutcome, PartsRepository,
    RecordingOperationLogger, SqliteConnectionProvider, StoreConfig,
};
use inventory_core::logging::EventStatus;
use rusqlite::Connection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

const STRICT_SCHEMA: &str = "CREATE TABLE pc_parts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    code TEXT NOT NULL,
    maker TEXT NOT NULL,
    availability INTEGER NOT NULL CHECK (availability >= 0),
    description TEXT
);";

/// Wraps the SQLite provider and counts every acquire and release.
struct CountingProvider {
    inner: SqliteConnectionProvider,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl CountingProvider {
    fn new(config: StoreConfig) -> Self {
        Self {
            inner: SqliteConnectionProvider::new(config),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.acquired.load(Ordering::SeqCst),
            self.released.load(Ordering::SeqCst),
        )
    }
}

impl ConnectionProvider for CountingProvider {
    fn open(&self, options: &CallOptions) -> OperationOutcome<Connection> {
        let conn = self.inner.open(options)?;
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        self.released.fetch_add(1, Ordering::SeqCst);
        self.inner.release(conn);
    }
}

struct PanickingProvider;

impl ConnectionProvider for PanickingProvider {
    fn open(&self, _options: &CallOptions) -> OperationOutcome<Connection> {
        panic!("driver exploded");
    }

    fn release(&self, _conn: Connection) {}
}

#[test]
fn failed_statement_still_releases_connection_exactly_once() {
    let (dir, repo, _) = strict_repo();
    drop_parts_table(&dir);

    let err = repo.list_all().unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExecutionError);
    assert_eq!(repo.provider().counts(), (1, 1));

    let err = repo.insert_part("a", "1", "Acme", "1", "").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExecutionError);
    assert_eq!(repo.provider().counts(), (2, 2));
}

#[test]
fn successful_operations_release_every_connection() {
    let (_dir, repo, _) = strict_repo();

    repo.insert_part("a", "1", "Acme", "1", "").unwrap();
    repo.find_by_brand("acme").unwrap();
    repo.find_by_brand_and_code("acme", 1).unwrap();
    repo.list_all().unwrap();
    repo.check_liveness().unwrap();

    assert_eq!(repo.provider().counts(), (5, 5));
}

#[test]
fn validation_failure_never_acquires_a_connection() {
    let (_dir, repo, logger) = strict_repo();

    let err = repo.insert_part("a", "1", "Acme", "x1", "").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);
    assert_eq!(repo.provider().counts(), (0, 0));
    assert_eq!(logger.error_kinds(), [ErrorKind::ValidationError]);
}

#[test]
fn constraint_violation_is_an_execution_error() {
    let (_dir, repo, logger) = strict_repo();

    let err = repo.insert_part("a", "1", "Acme", "-4", "").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExecutionError);
    assert!(err.detail.contains("CHECK"), "detail: {}", err.detail);
    assert_eq!(repo.provider().counts(), (1, 1));
    assert_eq!(logger.error_kinds(), [ErrorKind::ExecutionError]);
}

#[test]
fn missing_catalog_fails_every_operation_with_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::local(dir.path().join("missing.db").to_string_lossy());
    let logger = Arc::new(RecordingOperationLogger::new());
    let repo = PartsRepository::with_logger(CountingProvider::new(config), logger.clone());

    let outcomes = [
        repo.insert_part("a", "1", "Acme", "1", "").map(|_| ()),
        repo.find_by_brand("acme").map(|_| ()),
        repo.find_by_brand_and_code("acme", 1).map(|_| ()),
        repo.list_all().map(|_| ()),
        repo.check_liveness().map(|_| ()),
    ];

    for outcome in outcomes {
        assert_eq!(outcome.unwrap_err().kind, ErrorKind::ConnectionError);
    }
    assert_eq!(repo.provider().counts(), (0, 0));
    assert_eq!(logger.error_kinds(), [ErrorKind::ConnectionError; 5]);
}

#[test]
fn panics_inside_an_operation_become_unknown_failures() {
    let logger = Arc::new(RecordingOperationLogger::new());
    let repo = PartsRepository::with_logger(PanickingProvider, logger.clone());

    let err = repo.list_all().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert!(err.detail.contains("driver exploded"));

    let err = repo.insert_part("a", "1", "Acme", "1", "").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unknown);
    assert_eq!(logger.error_kinds(), [ErrorKind::Unknown, ErrorKind::Unknown]);
}

#[test]
fn every_call_emits_exactly_one_event() {
    let (_dir, repo, logger) = strict_repo();

    repo.insert_part("a", "1", "Acme", "1", "").unwrap();
    repo.list_all().unwrap();
    repo.find_by_brand("none").unwrap();

    let events = logger.events();
    let summary: Vec<_> = events
        .iter()
        .map(|event| (event.operation, event.status.clone()))
        .collect();
    assert_eq!(
        summary,
        [
            ("insert_part", EventStatus::Ok { rows: None }),
            ("list_all", EventStatus::Ok { rows: Some(1) }),
            ("find_by_brand", EventStatus::Ok { rows: Some(0) }),
        ]
    );
    assert_ne!(events[0].op_id, events[1].op_id);
}

#[test]
fn expired_deadline_fails_before_acquire() {
    let (_dir, repo, _) = strict_repo();

    let options = CallOptions::default().with_deadline(Instant::now());
    let err = repo.call(options).list_all().unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConnectionError);
    assert_eq!(repo.provider().counts(), (0, 0));
}

#[test]
fn cancelled_call_is_abandoned() {
    let (_dir, repo, _) = strict_repo();
    let flag = CancelFlag::new();
    let call = repo.call(CallOptions::default().with_cancel(flag.clone()));

    call.insert_part("a", "1", "Acme", "1", "").unwrap();
    flag.cancel();
    let err = call.list_all().unwrap_err();
    assert_eq!(err.kind, ErrorKind::ConnectionError);

    assert_eq!(repo.list_all().unwrap().len(), 1);
}

#[test]
fn generous_deadline_behaves_like_no_deadline() {
    let (_dir, repo, _) = strict_repo();
    let call = repo.call(CallOptions::default().with_timeout(std::time::Duration::from_secs(60)));

    call.insert_part("a", "1", "Acme", "1", "").unwrap();
    assert_eq!(call.list_all().unwrap(), repo.list_all().unwrap());
}

fn strict_repo() -> (
    TempDir,
    PartsRepository<CountingProvider>,
    Arc<RecordingOperationLogger>,
) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("parts.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(STRICT_SCHEMA).unwrap();
    drop(conn);

    let logger = Arc::new(RecordingOperationLogger::new());
    let provider = CountingProvider::new(StoreConfig::local(path.to_string_lossy()));
    let repo = PartsRepository::with_logger(provider, logger.clone());
    (dir, repo, logger)
}

fn drop_parts_table(dir: &TempDir) {
    let conn = Connection::open(dir.path().join("parts.db")).unwrap();
    conn.execute_batch("DROP TABLE pc_parts;").unwrap();
}
