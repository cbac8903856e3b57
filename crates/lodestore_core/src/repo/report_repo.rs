//! Report repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist normalized run trees (run row + summary rows + result rows).
//! - Load persisted statistics and collections for reporting consumers.
//! - Keep SQL details and row ordering inside the repository boundary.
//!
//! # Invariants
//! - `save_run` writes one run atomically; re-saving the same run replaces
//!   all of its rows.
//! - Row ordering is deterministic: `sort_order ASC` mirrors in-memory
//!   insertion order.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::run::{RunResult, RunSummary};
use crate::report::tree::{RunStatistics, SummaryTree};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Result type used by report repository operations.
pub type ReportRepoResult<T> = Result<T, ReportRepoError>;

/// Errors from report repository operations.
#[derive(Debug)]
pub enum ReportRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target run does not exist.
    RunNotFound(Uuid),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for ReportRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::RunNotFound(id) => write!(f, "run not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "report repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "report repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "report repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid report data: {message}"),
        }
    }
}

impl Error for ReportRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ReportRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ReportRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persisted summary row read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSummary {
    /// Summary name, unique within the run.
    pub name: String,
    /// Parent summary name. `None` means root-level summary.
    pub parent_name: Option<String>,
    /// Producer-reported test count.
    pub total_tests: u32,
    /// Producer-reported error count.
    pub errors: u32,
    /// Producer-reported fatal error count.
    pub fatal_errors: u32,
}

/// Persisted result row read model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedResult {
    /// Stable result identity.
    pub result_uuid: Uuid,
    /// Owning summary name; `None` for run-owned results.
    pub summary_name: Option<String>,
    /// Test name as reported by the execution layer.
    pub test_name: String,
    /// Outcome flag: regular error.
    pub has_error: bool,
    /// Outcome flag: fatal error.
    pub has_fatal_error: bool,
}

/// Repository interface for run report persistence.
pub trait ReportRepository {
    /// Persists one normalized run tree with its rolled-up statistics.
    fn save_run(&self, tree: &SummaryTree, statistics: &RunStatistics) -> ReportRepoResult<()>;
    /// Loads rolled-up statistics for one run, if present.
    fn load_run_statistics(&self, run_uuid: Uuid) -> ReportRepoResult<Option<RunStatistics>>;
    /// Lists persisted summaries for one run in stored order.
    fn list_summaries(&self, run_uuid: Uuid) -> ReportRepoResult<Vec<PersistedSummary>>;
    /// Lists persisted results for one run in stored order, optionally
    /// filtered to one owning summary (`None` lists run-owned results).
    fn list_results(
        &self,
        run_uuid: Uuid,
        summary_name: Option<&str>,
    ) -> ReportRepoResult<Vec<PersistedResult>>;
}

/// SQLite-backed report repository.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> ReportRepoResult<Self> {
        ensure_report_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn save_run(&self, tree: &SummaryTree, statistics: &RunStatistics) -> ReportRepoResult<()> {
        let run_uuid = tree.run_uuid().to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        // Re-saving a run replaces every row belonging to it.
        tx.execute("DELETE FROM runs WHERE run_uuid = ?1;", [run_uuid.as_str()])?;

        let environment = tree.environment();
        tx.execute(
            "INSERT INTO runs (
                run_uuid,
                hostname,
                os_name,
                runtime_version,
                total_tests,
                errors,
                fatal_errors
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                run_uuid,
                environment.hostname,
                environment.os_name,
                environment.runtime_version,
                i64::from(statistics.total_tests),
                i64::from(statistics.errors),
                i64::from(statistics.fatal_errors),
            ],
        )?;

        for (index, summary) in tree.summaries().iter().enumerate() {
            insert_summary_row(&tx, run_uuid.as_str(), summary, index as i64)?;
        }

        let mut result_order = 0i64;
        for summary in tree.summaries() {
            for result in summary.results() {
                insert_result_row(
                    &tx,
                    run_uuid.as_str(),
                    result,
                    Some(summary.name.as_str()),
                    result_order,
                )?;
                result_order += 1;
            }
        }
        for result in tree.results() {
            insert_result_row(&tx, run_uuid.as_str(), result, None, result_order)?;
            result_order += 1;
        }

        tx.commit()?;
        Ok(())
    }

    fn load_run_statistics(&self, run_uuid: Uuid) -> ReportRepoResult<Option<RunStatistics>> {
        let row = self
            .conn
            .query_row(
                "SELECT total_tests, errors, fatal_errors
                 FROM runs
                 WHERE run_uuid = ?1;",
                [run_uuid.to_string()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((total_tests, errors, fatal_errors)) => Ok(Some(RunStatistics {
                total_tests: parse_counter(total_tests, "runs.total_tests")?,
                errors: parse_counter(errors, "runs.errors")?,
                fatal_errors: parse_counter(fatal_errors, "runs.fatal_errors")?,
            })),
        }
    }

    fn list_summaries(&self, run_uuid: Uuid) -> ReportRepoResult<Vec<PersistedSummary>> {
        self.ensure_run_exists(run_uuid)?;

        let mut stmt = self.conn.prepare(
            "SELECT name, parent_name, total_tests, errors, fatal_errors
             FROM run_summaries
             WHERE run_uuid = ?1
             ORDER BY sort_order ASC;",
        )?;
        let mut rows = stmt.query([run_uuid.to_string()])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_summary_row(row)?);
        }
        Ok(items)
    }

    fn list_results(
        &self,
        run_uuid: Uuid,
        summary_name: Option<&str>,
    ) -> ReportRepoResult<Vec<PersistedResult>> {
        self.ensure_run_exists(run_uuid)?;

        let sql = if summary_name.is_some() {
            "SELECT result_uuid, summary_name, test_name, has_error, has_fatal_error
             FROM run_results
             WHERE run_uuid = ?1
               AND summary_name = ?2
             ORDER BY sort_order ASC;"
        } else {
            "SELECT result_uuid, summary_name, test_name, has_error, has_fatal_error
             FROM run_results
             WHERE run_uuid = ?1
               AND summary_name IS NULL
             ORDER BY sort_order ASC;"
        };

        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = match summary_name {
            Some(name) => stmt.query(params![run_uuid.to_string(), name])?,
            None => stmt.query([run_uuid.to_string()])?,
        };

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_result_row(row)?);
        }
        Ok(items)
    }
}

impl SqliteReportRepository<'_> {
    fn ensure_run_exists(&self, run_uuid: Uuid) -> ReportRepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM runs
                WHERE run_uuid = ?1
            );",
            [run_uuid.to_string()],
            |row| row.get(0),
        )?;
        if exists == 1 {
            Ok(())
        } else {
            Err(ReportRepoError::RunNotFound(run_uuid))
        }
    }
}

fn insert_summary_row(
    conn: &Connection,
    run_uuid: &str,
    summary: &RunSummary,
    sort_order: i64,
) -> ReportRepoResult<()> {
    conn.execute(
        "INSERT INTO run_summaries (
            run_uuid,
            name,
            parent_name,
            total_tests,
            errors,
            fatal_errors,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            run_uuid,
            summary.name,
            summary.parent,
            i64::from(summary.total_tests),
            i64::from(summary.errors),
            i64::from(summary.fatal_errors),
            sort_order,
        ],
    )?;
    Ok(())
}

fn insert_result_row(
    conn: &Connection,
    run_uuid: &str,
    result: &RunResult,
    summary_name: Option<&str>,
    sort_order: i64,
) -> ReportRepoResult<()> {
    conn.execute(
        "INSERT INTO run_results (
            result_uuid,
            run_uuid,
            summary_name,
            test_name,
            has_error,
            has_fatal_error,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            result.result_uuid.to_string(),
            run_uuid,
            summary_name,
            result.test_name,
            i64::from(result.has_error),
            i64::from(result.has_fatal_error),
            sort_order,
        ],
    )?;
    Ok(())
}

fn parse_summary_row(row: &Row<'_>) -> ReportRepoResult<PersistedSummary> {
    Ok(PersistedSummary {
        name: row.get("name")?,
        parent_name: row.get("parent_name")?,
        total_tests: parse_counter(row.get("total_tests")?, "run_summaries.total_tests")?,
        errors: parse_counter(row.get("errors")?, "run_summaries.errors")?,
        fatal_errors: parse_counter(row.get("fatal_errors")?, "run_summaries.fatal_errors")?,
    })
}

fn parse_result_row(row: &Row<'_>) -> ReportRepoResult<PersistedResult> {
    let result_uuid_text: String = row.get("result_uuid")?;
    Ok(PersistedResult {
        result_uuid: parse_uuid(&result_uuid_text, "run_results.result_uuid")?,
        summary_name: row.get("summary_name")?,
        test_name: row.get("test_name")?,
        has_error: parse_flag(row.get("has_error")?, "run_results.has_error")?,
        has_fatal_error: parse_flag(row.get("has_fatal_error")?, "run_results.has_fatal_error")?,
    })
}

fn parse_counter(value: i64, column: &'static str) -> ReportRepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| ReportRepoError::InvalidData(format!("invalid counter `{value}` in {column}")))
}

fn parse_flag(value: i64, column: &'static str) -> ReportRepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ReportRepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn parse_uuid(value: &str, column: &'static str) -> ReportRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| ReportRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn ensure_report_connection_ready(conn: &Connection) -> ReportRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(ReportRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const REQUIRED: &[(&str, &[&str])] = &[
        (
            "runs",
            &[
                "run_uuid",
                "hostname",
                "os_name",
                "runtime_version",
                "total_tests",
                "errors",
                "fatal_errors",
            ],
        ),
        (
            "run_summaries",
            &[
                "run_uuid",
                "name",
                "parent_name",
                "total_tests",
                "errors",
                "fatal_errors",
                "sort_order",
            ],
        ),
        (
            "run_results",
            &[
                "result_uuid",
                "run_uuid",
                "summary_name",
                "test_name",
                "has_error",
                "has_fatal_error",
                "sort_order",
            ],
        ),
    ];

    for &(table, columns) in REQUIRED {
        if !table_exists(conn, table)? {
            return Err(ReportRepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(ReportRepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> ReportRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> ReportRepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
