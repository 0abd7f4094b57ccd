use super::*;
use pretty_assertions::assert_eq;
use trial_ir::unique_id;

fn id(name: &str) -> UniqueId {
    unique_id::hash([name])
}

fn collection(results: Vec<TestResult>) -> CollectionSummary {
    let mut summary = CollectionSummary::new("Test collection for Ns.A");
    for result in results {
        summary.add_result(result);
    }
    summary
}

#[test]
fn test_collection_counts_outcomes() {
    let summary = collection(vec![
        TestResult::passed(id("a"), "a".into(), Duration::from_millis(4)),
        TestResult::failed(id("b"), "b".into(), "boom".into(), Duration::from_millis(6)),
        TestResult::skipped(id("c"), "c".into(), "later".into()),
        TestResult::not_run(id("d"), "d".into()),
    ]);

    assert_eq!(
        summary.totals(),
        ExecutionTotals {
            total: 4,
            failed: 1,
            skipped: 1,
            not_run: 1,
            time: Duration::from_millis(10),
        }
    );
    assert_eq!(summary.totals().passed(), 1);
    assert!(summary.has_failures());
}

#[test]
fn test_single_result_totals() {
    let result = TestResult::skipped(id("c"), "c".into(), "later".into());
    let totals = result.totals();
    assert_eq!((totals.total, totals.skipped, totals.failed), (1, 1, 0));
}

#[test]
fn test_exit_codes() {
    let mut empty = RunSummary::new();
    assert_eq!(empty.exit_code(), 2);
    empty.add_collection(CollectionSummary::new("empty"));
    assert_eq!(empty.exit_code(), 2);

    let mut passing = RunSummary::new();
    passing.add_collection(collection(vec![TestResult::passed(
        id("a"),
        "a".into(),
        Duration::ZERO,
    )]));
    assert_eq!(passing.exit_code(), 0);

    let mut failing = RunSummary::new();
    failing.add_collection(collection(vec![TestResult::failed(
        id("a"),
        "a".into(),
        "no".into(),
        Duration::ZERO,
    )]));
    assert_eq!(failing.exit_code(), 1);
}

#[test]
fn test_cleanup_errors_fail_the_run() {
    let mut errored = CollectionSummary::new("c");
    errored.add_result(TestResult::passed(id("a"), "a".into(), Duration::ZERO));
    errored.add_error("Collection hook 'db' failed: timeout".into());

    let mut run = RunSummary::new();
    run.add_collection(errored);
    assert_eq!(run.error_collections, 1);
    assert!(run.has_failures());
    assert_eq!(run.exit_code(), 1);
    assert_eq!(run.results().count(), 1);
}
