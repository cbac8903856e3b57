use lodestore_core::db::open_db_in_memory;
use lodestore_core::{
    EnvironmentSnapshot, ReportRepository, ReportService, RunResult, RunSummary,
    SqliteReportRepository, SummaryTree,
};
use uuid::Uuid;

fn setup() -> rusqlite::Connection {
    open_db_in_memory().unwrap()
}

fn environment() -> EnvironmentSnapshot {
    EnvironmentSnapshot::new("ci-host-01", "linux", "rustc 1.80.0")
}

fn sample_tree() -> SummaryTree {
    let mut tree = SummaryTree::new(environment());

    let mut core = RunSummary::new("Core").with_counters(5, 1, 0);
    core.add_result(RunResult::with_error("core::regression"));
    tree.upsert_summary(core);
    tree.upsert_summary(RunSummary::new("Core.Inner").with_parent("Core"));

    tree.add_result(RunResult::with_error("standalone::failing"));
    tree.add_result(RunResult::passed("standalone::passing"));
    tree
}

#[test]
fn finalize_run_persists_statistics() {
    let conn = setup();
    let repo = SqliteReportRepository::try_new(&conn).unwrap();
    let service = ReportService::new(repo);

    let mut tree = sample_tree();
    let statistics = service.finalize_run(&mut tree).unwrap();
    assert_eq!(statistics.total_tests, 7);
    assert_eq!(statistics.errors, 2);
    assert_eq!(statistics.fatal_errors, 0);

    let loaded = service.run_statistics(tree.run_uuid()).unwrap().unwrap();
    assert_eq!(loaded, statistics);
}

#[test]
fn persisted_summaries_keep_insertion_order_and_parent_links() {
    let conn = setup();
    let repo = SqliteReportRepository::try_new(&conn).unwrap();
    let service = ReportService::new(repo);

    let mut tree = sample_tree();
    service.finalize_run(&mut tree).unwrap();

    let summaries = service.summaries(tree.run_uuid()).unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].name, "Core");
    assert_eq!(summaries[0].parent_name, None);
    assert_eq!(summaries[0].total_tests, 5);
    assert_eq!(summaries[1].name, "Core.Inner");
    assert_eq!(summaries[1].parent_name, Some("Core".to_string()));
}

#[test]
fn persisted_results_are_scoped_by_owner() {
    let conn = setup();
    let repo = SqliteReportRepository::try_new(&conn).unwrap();
    let service = ReportService::new(repo);

    let mut tree = sample_tree();
    service.finalize_run(&mut tree).unwrap();

    let run_owned = service.results(tree.run_uuid(), None).unwrap();
    assert_eq!(run_owned.len(), 2);
    assert_eq!(run_owned[0].test_name, "standalone::failing");
    assert!(run_owned[0].has_error);

    let core_owned = service.results(tree.run_uuid(), Some("Core")).unwrap();
    assert_eq!(core_owned.len(), 1);
    assert_eq!(core_owned[0].test_name, "core::regression");
    assert_eq!(core_owned[0].summary_name, Some("Core".to_string()));
}

#[test]
fn resaving_a_run_replaces_its_rows() {
    let conn = setup();
    let repo = SqliteReportRepository::try_new(&conn).unwrap();
    let service = ReportService::new(repo);

    let mut tree = sample_tree();
    service.finalize_run(&mut tree).unwrap();
    // Second finalize of the same run must overwrite, not append.
    service.finalize_run(&mut tree).unwrap();

    let summaries = service.summaries(tree.run_uuid()).unwrap();
    assert_eq!(summaries.len(), 2);
    let run_owned = service.results(tree.run_uuid(), None).unwrap();
    assert_eq!(run_owned.len(), 2);
}

#[test]
fn listing_an_unknown_run_is_a_semantic_error() {
    let conn = setup();
    let repo = SqliteReportRepository::try_new(&conn).unwrap();

    let missing = Uuid::new_v4();
    assert!(repo.load_run_statistics(missing).unwrap().is_none());
    assert!(repo.list_summaries(missing).is_err());
}

#[test]
fn repository_rejects_unmigrated_connection() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    assert!(SqliteReportRepository::try_new(&conn).is_err());
}

#[test]
fn double_counted_result_is_persisted_once_after_finalize() {
    let conn = setup();
    let repo = SqliteReportRepository::try_new(&conn).unwrap();
    let service = ReportService::new(repo);

    let mut tree = SummaryTree::new(environment());
    let shared = RunResult::with_error("core::regression");
    let mut summary = RunSummary::new("Core").with_counters(1, 1, 0);
    summary.add_result(shared.clone());
    tree.upsert_summary(summary);
    tree.add_result(shared);

    service.finalize_run(&mut tree).unwrap();

    let run_owned = service.results(tree.run_uuid(), None).unwrap();
    assert!(run_owned.is_empty(), "summary-owned result must not persist at run level");
    let core_owned = service.results(tree.run_uuid(), Some("Core")).unwrap();
    assert_eq!(core_owned.len(), 1);
}
