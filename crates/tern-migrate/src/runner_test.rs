use super::*;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::{tempdir, TempDir};
use tern_core::CoreError;
use tern_db::{DbResult, DuckDbBackend};

const LEDGER: &str = "tern_migrations";

// ── Helpers ────────────────────────────────────────────────────────────

/// In-memory `Database` double that records every call and simulates a
/// transaction over its ledger.
#[derive(Default)]
struct RecordingDb {
    state: Mutex<RecordingState>,
    /// SQL containing this text fails to execute
    fail_on: Option<String>,
    fail_record: bool,
    fail_commit: bool,
    fail_rollback: bool,
}

#[derive(Default)]
struct RecordingState {
    calls: Vec<String>,
    executed: Vec<String>,
    ledger: Vec<LedgerEntry>,
    staged: Vec<LedgerEntry>,
}

impl RecordingDb {
    fn with_ledger(names: &[&str]) -> Self {
        let db = Self::default();
        db.state.lock().unwrap().ledger = names.iter().map(|n| entry(n)).collect();
        db
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    fn ledger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .lock()
            .unwrap()
            .ledger
            .iter()
            .map(|e| e.name.clone())
            .collect();
        names.sort();
        names
    }

    fn record_call(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

#[async_trait]
impl Database for RecordingDb {
    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.record_call("execute");
        if self.fail_on.as_deref().is_some_and(|f| sql.contains(f)) {
            return Err(DbError::ExecutionError(format!("rejected: {sql}")));
        }
        self.state.lock().unwrap().executed.push(sql.to_string());
        Ok(())
    }

    async fn begin(&self) -> DbResult<()> {
        self.record_call("begin");
        Ok(())
    }

    async fn commit(&self) -> DbResult<()> {
        self.record_call("commit");
        if self.fail_commit {
            return Err(DbError::TransactionError {
                action: "COMMIT",
                message: "could not serialize access".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        let staged = std::mem::take(&mut state.staged);
        state.ledger.extend(staged);
        Ok(())
    }

    async fn rollback(&self) -> DbResult<()> {
        self.record_call("rollback");
        if self.fail_rollback {
            return Err(DbError::TransactionError {
                action: "ROLLBACK",
                message: "connection lost".to_string(),
            });
        }
        self.state.lock().unwrap().staged.clear();
        Ok(())
    }

    async fn ensure_ledger(&self, _table: &str) -> DbResult<()> {
        self.record_call("ensure_ledger");
        Ok(())
    }

    async fn fetch_ledger(&self, _table: &str) -> DbResult<Vec<LedgerEntry>> {
        self.record_call("fetch_ledger");
        Ok(self.state.lock().unwrap().ledger.clone())
    }

    async fn record_migrations(&self, _table: &str, entries: &[LedgerEntry]) -> DbResult<()> {
        self.record_call("record_migrations");
        if self.fail_record {
            return Err(DbError::ExecutionError("ledger is read-only".to_string()));
        }
        self.state.lock().unwrap().staged.extend_from_slice(entries);
        Ok(())
    }

    fn db_type(&self) -> &'static str {
        "recording"
    }
}

fn entry(name: &str) -> LedgerEntry {
    LedgerEntry::for_migration(&MigrationName::parse(name).unwrap())
}

fn options() -> RunOptions {
    RunOptions {
        ledger_table: LEDGER.to_string(),
        strict: false,
        dry_run: false,
    }
}

/// Write `(name, apply_sql)` artifacts into a fresh migrations directory.
fn migrations_dir(artifacts: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let root = tempdir().unwrap();
    let dir = root.path().join("migrations");
    fs::create_dir_all(&dir).unwrap();
    for (name, sql) in artifacts {
        fs::write(
            dir.join(format!("{name}.sql")),
            format!("-- migrate:apply\n{sql}\n\n-- migrate:revert\n"),
        )
        .unwrap();
    }
    (root, dir)
}

/// Whether `name` can be selected from, i.e. the table exists.
async fn table_exists(db: &DuckDbBackend, name: &str) -> bool {
    db.execute_batch(&format!("SELECT * FROM {name} LIMIT 0"))
        .await
        .is_ok()
}

fn names(report: &RunReport) -> Vec<&str> {
    report.applied.iter().map(|n| n.as_str()).collect()
}

// ── Planning ───────────────────────────────────────────────────────────

#[test]
fn test_plan_splits_pending_and_applied() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_init", "SELECT 1;"),
        ("20240102000000_add_col", "SELECT 2;"),
        ("20240103000000_index", "SELECT 3;"),
    ]);
    let artifacts = discover_artifacts(&dir).unwrap();
    let ledger = vec![entry("20240102000000_add_col"), entry("20231201000000_old")];

    let plan = plan(&artifacts, &ledger);
    let pending: Vec<&str> = plan.pending.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(pending, vec!["20240101000000_init", "20240103000000_index"]);
    assert_eq!(plan.applied.len(), 1);
    assert_eq!(plan.orphaned, vec!["20231201000000_old".to_string()]);
}

// ── Runner against the recording double ────────────────────────────────

#[tokio::test]
async fn test_run_applies_only_missing_migration() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_init", "CREATE TABLE t (id INT);"),
        ("20240102000000_add_col", "ALTER TABLE t ADD COLUMN c INT;"),
    ]);
    let db = RecordingDb::with_ledger(&["20240101000000_init"]);

    let report = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(names(&report), vec!["20240102000000_add_col"]);
    assert_eq!(report.already_applied, 1);
    assert_eq!(db.executed(), vec!["ALTER TABLE t ADD COLUMN c INT;"]);
    assert_eq!(
        db.state.lock().unwrap().ledger.last().cloned(),
        Some(LedgerEntry {
            id: "20240102000000".to_string(),
            name: "20240102000000_add_col".to_string(),
        })
    );
    assert_eq!(db.calls().last().map(String::as_str), Some("commit"));
}

#[tokio::test]
async fn test_run_with_everything_applied_is_a_no_op() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_init", "CREATE TABLE t (id INT);"),
        ("20240102000000_add_col", "ALTER TABLE t ADD COLUMN c INT;"),
    ]);
    let db = RecordingDb::with_ledger(&["20240101000000_init", "20240102000000_add_col"]);

    let report = run(&db, &dir, &options()).await.unwrap();

    assert!(report.applied.is_empty());
    assert!(db.executed().is_empty());
    assert_eq!(
        db.calls(),
        vec!["begin", "ensure_ledger", "fetch_ledger", "commit"]
    );
}

#[tokio::test]
async fn test_run_applies_in_name_order() {
    let (_root, dir) = migrations_dir(&[
        ("20240103000000_third", "SELECT 3;"),
        ("20240101000000_first", "SELECT 1;"),
        ("20240102000000_second", "SELECT 2;"),
    ]);
    let db = RecordingDb::default();

    let report = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(db.executed(), vec!["SELECT 1;", "SELECT 2;", "SELECT 3;"]);
    assert_eq!(
        names(&report),
        vec![
            "20240101000000_first",
            "20240102000000_second",
            "20240103000000_third"
        ]
    );
    assert_eq!(db.ledger_names().len(), 3);
}

#[tokio::test]
async fn test_ledger_written_once_after_all_applies() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_a", "SELECT 1;"),
        ("20240102000000_b", "SELECT 2;"),
    ]);
    let db = RecordingDb::default();

    run(&db, &dir, &options()).await.unwrap();

    assert_eq!(
        db.calls(),
        vec![
            "begin",
            "ensure_ledger",
            "fetch_ledger",
            "execute",
            "execute",
            "record_migrations",
            "commit"
        ]
    );
}

#[tokio::test]
async fn test_failure_stops_and_rolls_back() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_a", "SELECT 1;"),
        ("20240102000000_b", "BROKEN SQL;"),
        ("20240103000000_c", "SELECT 3;"),
    ]);
    let db = RecordingDb {
        fail_on: Some("BROKEN".to_string()),
        ..Default::default()
    };

    let err = run(&db, &dir, &options()).await.unwrap_err();

    match err {
        MigrateError::ApplyFailed { name, .. } => assert_eq!(name, "20240102000000_b"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(db.executed(), vec!["SELECT 1;"]);
    let calls = db.calls();
    assert!(!calls.contains(&"record_migrations".to_string()));
    assert!(!calls.contains(&"commit".to_string()));
    assert_eq!(calls.last().map(String::as_str), Some("rollback"));
    assert!(db.ledger_names().is_empty());
}

#[tokio::test]
async fn test_ledger_failure_rolls_back() {
    let (_root, dir) = migrations_dir(&[("20240101000000_a", "SELECT 1;")]);
    let db = RecordingDb {
        fail_record: true,
        ..Default::default()
    };

    let err = run(&db, &dir, &options()).await.unwrap_err();

    assert!(matches!(err, MigrateError::Ledger { .. }));
    assert_eq!(db.calls().last().map(String::as_str), Some("rollback"));
    assert!(db.ledger_names().is_empty());
}

#[tokio::test]
async fn test_commit_failure_rolls_back_and_reports_transaction_error() {
    let (_root, dir) = migrations_dir(&[("20240101000000_a", "SELECT 1;")]);
    let db = RecordingDb {
        fail_commit: true,
        ..Default::default()
    };

    let err = run(&db, &dir, &options()).await.unwrap_err();

    match err {
        MigrateError::Transaction { source } => assert!(matches!(
            source,
            DbError::TransactionError {
                action: "COMMIT",
                ..
            }
        )),
        other => panic!("unexpected error: {other}"),
    }
    let calls = db.calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        &["commit".to_string(), "rollback".to_string()]
    );
    assert!(db.ledger_names().is_empty());
}

#[tokio::test]
async fn test_failed_rollback_keeps_original_error() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_a", "SELECT 1;"),
        ("20240102000000_b", "BROKEN SQL;"),
    ]);
    let db = RecordingDb {
        fail_on: Some("BROKEN".to_string()),
        fail_rollback: true,
        ..Default::default()
    };

    let err = run(&db, &dir, &options()).await.unwrap_err();

    match err {
        MigrateError::ApplyFailed { name, .. } => assert_eq!(name, "20240102000000_b"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(db.calls().last().map(String::as_str), Some("rollback"));
    assert!(db.ledger_names().is_empty());
}

#[tokio::test]
async fn test_missing_apply_section_rolls_back() {
    let (_root, dir) = migrations_dir(&[("20240101000000_a", "SELECT 1;")]);
    fs::write(
        dir.join("20240102000000_b.sql"),
        "-- migrate:revert\nDROP TABLE t;\n",
    )
    .unwrap();
    let db = RecordingDb::default();

    let err = run(&db, &dir, &options()).await.unwrap_err();

    match err {
        MigrateError::Core(CoreError::MissingApply { name }) => {
            assert_eq!(name, "20240102000000_b")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(db.calls().last().map(String::as_str), Some("rollback"));
    assert!(db.ledger_names().is_empty());
}

#[tokio::test]
async fn test_missing_directory_fails_before_transaction() {
    let root = tempdir().unwrap();
    let db = RecordingDb::default();

    let err = run(&db, &root.path().join("migrations"), &options())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MigrateError::Core(CoreError::MigrationsDirNotFound { .. })
    ));
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn test_empty_directory_fails_before_transaction() {
    let (_root, dir) = migrations_dir(&[]);
    let db = RecordingDb::default();

    let err = run(&db, &dir, &options()).await.unwrap_err();

    assert!(matches!(err, MigrateError::Core(CoreError::NoMigrations { .. })));
    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn test_empty_apply_is_recorded_without_execution() {
    let (_root, dir) = migrations_dir(&[("20240101000000_placeholder", "")]);
    let db = RecordingDb::default();

    let report = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(names(&report), vec!["20240101000000_placeholder"]);
    assert!(db.executed().is_empty());
    assert_eq!(db.ledger_names(), vec!["20240101000000_placeholder"]);
}

#[tokio::test]
async fn test_orphaned_ledger_entries_warn_by_default() {
    let (_root, dir) = migrations_dir(&[("20240101000000_a", "SELECT 1;")]);
    let db = RecordingDb::with_ledger(&["20231231000000_gone"]);

    let report = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(report.orphaned, vec!["20231231000000_gone".to_string()]);
    assert_eq!(names(&report), vec!["20240101000000_a"]);
}

#[tokio::test]
async fn test_orphaned_ledger_entries_fail_when_strict() {
    let (_root, dir) = migrations_dir(&[("20240101000000_a", "SELECT 1;")]);
    let db = RecordingDb::with_ledger(&["20231231000000_gone"]);
    let opts = RunOptions {
        strict: true,
        ..options()
    };

    let err = run(&db, &dir, &opts).await.unwrap_err();

    match err {
        MigrateError::UnknownLedgerEntries { names } => {
            assert_eq!(names, vec!["20231231000000_gone".to_string()])
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(db.executed().is_empty());
    assert_eq!(db.calls().last().map(String::as_str), Some("rollback"));
}

#[tokio::test]
async fn test_dry_run_executes_nothing() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_a", "SELECT 1;"),
        ("20240102000000_b", "SELECT 2;"),
    ]);
    let db = RecordingDb::with_ledger(&["20240101000000_a"]);
    let opts = RunOptions {
        dry_run: true,
        ..options()
    };

    let report = run(&db, &dir, &opts).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(names(&report), vec!["20240102000000_b"]);
    assert!(db.executed().is_empty());
    assert_eq!(db.calls().last().map(String::as_str), Some("rollback"));
    assert_eq!(db.ledger_names(), vec!["20240101000000_a"]);
}

// ── Runner against DuckDB ──────────────────────────────────────────────

#[tokio::test]
async fn test_duckdb_concrete_scenario() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_init", "CREATE TABLE t (id INTEGER);"),
        ("20240102000000_add_col", "ALTER TABLE t ADD COLUMN c VARCHAR;"),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();
    db.ensure_ledger(LEDGER).await.unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
    db.record_migrations(LEDGER, &[entry("20240101000000_init")])
        .await
        .unwrap();

    let report = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(names(&report), vec!["20240102000000_add_col"]);
    db.execute_batch("SELECT c FROM t").await.unwrap();
    let mut ledger = db.fetch_ledger(LEDGER).await.unwrap();
    ledger.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(
        ledger,
        vec![entry("20240101000000_init"), entry("20240102000000_add_col")]
    );
}

#[tokio::test]
async fn test_duckdb_failure_leaves_database_untouched() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_users", "CREATE TABLE users (id INTEGER);"),
        ("20240102000000_broken", "ALTER TABLE missing ADD COLUMN x INT;"),
        ("20240103000000_orders", "CREATE TABLE orders (id INTEGER);"),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();

    let err = run(&db, &dir, &options()).await.unwrap_err();

    assert!(matches!(err, MigrateError::ApplyFailed { ref name, .. } if name == "20240102000000_broken"));
    assert!(!table_exists(&db, "users").await);
    assert!(!table_exists(&db, "orders").await);
    assert!(!table_exists(&db, LEDGER).await);
}

#[tokio::test]
async fn test_duckdb_second_run_is_idempotent() {
    let (_root, dir) = migrations_dir(&[
        ("20240101000000_users", "CREATE TABLE users (id INTEGER PRIMARY KEY);"),
        ("20240102000000_seed", "INSERT INTO users VALUES (1), (2);"),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();

    let first = run(&db, &dir, &options()).await.unwrap();
    let second = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(first.applied.len(), 2);
    assert!(second.applied.is_empty());
    assert_eq!(second.already_applied, 2);
    assert_eq!(db.fetch_ledger(LEDGER).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_duckdb_new_file_after_first_run() {
    let (_root, dir) = migrations_dir(&[("20240101000000_users", "CREATE TABLE users (id INTEGER);")]);
    let db = DuckDbBackend::in_memory().unwrap();
    run(&db, &dir, &options()).await.unwrap();

    fs::write(
        dir.join("20240201000000_orders.sql"),
        "-- migrate:apply\nCREATE TABLE orders (id INTEGER);\n",
    )
    .unwrap();
    let report = run(&db, &dir, &options()).await.unwrap();

    assert_eq!(names(&report), vec!["20240201000000_orders"]);
    assert!(table_exists(&db, "orders").await);
}
