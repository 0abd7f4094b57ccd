#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Discover, filter, order, execute and report against an in-memory module.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use trial_discovery::{AssemblyInfo, MethodInfo, StaticModule, TestMarker, TypeInfo};
use trial_exec::{FrontController, Invocation, TestOutcome};
use trial_filter::TestFilters;
use trial_ir::{DataRow, InlineData, TestUnit, Value};
use trial_messages::{Message, MessageBus, MessageKind, MessageRecorder, MessageSink};
use trial_order::order_key;
use trial_report::{
    BatchTransport, BatchingReporter, ConsoleReporter, RemoteId, RunId, TestRecord, TransportError,
};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn calculator_module() -> StaticModule {
    let mut info = AssemblyInfo::new("calc", "/bin/calc");
    info.traits.add("Suite", "unit");
    StaticModule::new(info)
        .with_type(
            TypeInfo::new("Ns.Math.Calc").with_trait("Category", "math"),
            vec![
                MethodInfo::new("Adds").marked(TestMarker::fact()),
                MethodInfo::new("Divides")
                    .with_parameters(["a", "b"])
                    .marked(TestMarker::theory())
                    .with_data(InlineData::new(vec![
                        DataRow::new(vec![Value::Int(4), Value::Int(2)]),
                        DataRow::new(vec![Value::Int(1), Value::Int(0)]),
                    ])),
                MethodInfo::new("Ignored").marked(TestMarker::fact().with_skip("flaky")),
            ],
        )
        .with_type(
            TypeInfo::new("Ns.Math.Odd"),
            vec![MethodInfo::new("Generic")
                .generic()
                .marked(TestMarker::fact())],
        )
        .with_type(
            TypeInfo::new("Ns.Slow.Db").with_trait("Category", "slow"),
            vec![MethodInfo::new("Query").marked(TestMarker::fact())],
        )
}

fn invoke(unit: &TestUnit, arguments: &[Value]) -> Invocation {
    match arguments {
        [Value::Int(_), Value::Int(0)] => {
            Invocation::failed("attempt to divide by zero", Duration::from_millis(1))
        }
        _ if unit.method.name == "Query" => panic!("slow tests must be filtered out"),
        _ => Invocation::passed(Duration::from_millis(1)),
    }
}

fn not_slow() -> TestFilters {
    let mut filters = TestFilters::new();
    filters.exclude_trait_text("category=slow").unwrap();
    filters
}

#[test]
fn test_find_and_run_reports_through_the_console() {
    let module = calculator_module();
    let bus = MessageBus::new();
    let buffer = SharedBuffer::default();
    bus.subscribe_all(Arc::new(ConsoleReporter::new(Box::new(buffer.clone()), false)));
    let recorder = MessageRecorder::new();
    bus.subscribe_kinds(
        &[MessageKind::DiscoveryComplete, MessageKind::Diagnostic],
        &(recorder.clone() as Arc<dyn MessageSink>),
    );

    let controller = FrontController::new(&module, &bus);
    let summary = controller.find_and_run(&not_slow(), &invoke);

    assert_eq!(
        (summary.passed, summary.failed, summary.skipped, summary.not_run),
        (2, 2, 1, 0)
    );
    assert_eq!(summary.exit_code(), 1);
    let mut failures: Vec<(String, TestOutcome)> = summary
        .results()
        .filter(|r| r.outcome.is_failed())
        .map(|r| (r.display_name.clone(), r.outcome.clone()))
        .collect();
    failures.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        failures,
        vec![
            (
                "Ns.Math.Calc.Divides(a: 1, b: 0)".to_string(),
                TestOutcome::Failed("attempt to divide by zero".into())
            ),
            (
                "Ns.Math.Odd.Generic".to_string(),
                TestOutcome::Failed(
                    "Test method 'Ns.Math.Odd.Generic' cannot be a generic method".into()
                )
            ),
        ]
    );

    // Discovery counts what it found, before filtering.
    match recorder.of_kind(MessageKind::DiscoveryComplete).pop().unwrap() {
        Message::DiscoveryComplete { test_cases, .. } => assert_eq!(test_cases, 6),
        other => panic!("unexpected {other:?}"),
    }
    assert!(recorder.of_kind(MessageKind::Diagnostic).is_empty());

    let text = String::from_utf8(buffer.0.lock().clone()).unwrap();
    assert!(
        text.contains("  FAIL: Ns.Math.Calc.Divides(a: 1, b: 0) - attempt to divide by zero\n")
    );
    assert!(text.contains("  SKIP: Ns.Math.Calc.Ignored - flaky\n"));
    assert!(!text.contains("PASS"));
    let last = text.lines().last().unwrap();
    assert!(last.starts_with("calc: 2 passed, 2 failed, 1 skipped, 0 not run (5 total) in "));
}

#[derive(Default)]
struct MemoryTransport {
    records: Arc<Mutex<Vec<TestRecord>>>,
}

impl BatchTransport for MemoryTransport {
    fn start_run(&mut self) -> Result<RunId, TransportError> {
        Ok(RunId(7))
    }

    fn add_tests(
        &mut self,
        _run: RunId,
        tests: &[TestRecord],
    ) -> Result<Vec<RemoteId>, TransportError> {
        let mut records = self.records.lock();
        let first = records.len() as u64;
        records.extend(tests.iter().cloned());
        Ok((0..tests.len() as u64).map(|i| RemoteId(first + i)).collect())
    }

    fn update_tests(
        &mut self,
        _run: RunId,
        updates: &[(RemoteId, TestRecord)],
    ) -> Result<(), TransportError> {
        let mut records = self.records.lock();
        for (id, update) in updates {
            let record = &mut records[usize::try_from(id.0).unwrap()];
            record.outcome = update.outcome;
            record.message.clone_from(&update.message);
        }
        Ok(())
    }

    fn finish_run(&mut self, _run: RunId) -> Result<(), TransportError> {
        Ok(())
    }
}

#[test]
fn test_batching_reporter_sees_every_result() {
    let module = calculator_module();
    let bus = MessageBus::new();
    let transport = MemoryTransport::default();
    let records = Arc::clone(&transport.records);
    let reporter = Arc::new(BatchingReporter::new(transport).unwrap());
    bus.subscribe_all(reporter.clone());

    let mut controller = FrontController::new(&module, &bus);
    controller.runner.parallelize_collections = false;
    let summary = controller.find_and_run(&not_slow(), &invoke);
    reporter.finish();

    assert!(!reporter.has_failed());
    let records = records.lock();
    assert_eq!(records.len(), summary.total());
    assert!(records.iter().all(|r| r.outcome.is_some()));
    let failed_messages: usize = records.iter().filter(|r| r.message.is_some()).count();
    // Two failures and one skip carry a message.
    assert_eq!(failed_messages, 3);
}

fn fact_and_theory_module(rows: [i64; 2]) -> StaticModule {
    StaticModule::new(AssemblyInfo::new("mixed", "/bin/mixed")).with_type(
        TypeInfo::new("Ns.C"),
        vec![
            MethodInfo::new("Fact").marked(TestMarker::fact()),
            MethodInfo::new("Theory")
                .with_parameters(["x"])
                .marked(TestMarker::theory())
                .with_data(InlineData::new(
                    rows.iter().map(|&n| DataRow::new(vec![Value::Int(n)])).collect(),
                )),
        ],
    )
}

fn theory_rows(module: &StaticModule) -> Vec<TestUnit> {
    let bus = MessageBus::new();
    FrontController::new(module, &bus)
        .discover()
        .into_iter()
        .filter(|unit| unit.method.name == "Theory")
        .collect()
}

#[test]
fn test_exclude_method_then_order_yields_theory_rows() {
    // Pick row arguments whose digest order inverts declaration order.
    let (module, declared) = (2..64)
        .map(|second| fact_and_theory_module([1, second]))
        .find_map(|module| {
            let rows = theory_rows(&module);
            let key = |unit: &TestUnit| (order_key(&unit.unique_id), unit.unique_id.clone());
            (key(&rows[0]) > key(&rows[1])).then_some((module, rows))
        })
        .expect("some row pair sorts in reverse declaration order");
    let declared: Vec<String> = declared.into_iter().map(|unit| unit.display_name).collect();

    let mut filters = TestFilters::new();
    filters.exclude_method("Ns.C.Fact").unwrap();

    let run = || -> Vec<String> {
        let bus = MessageBus::new();
        let mut controller = FrontController::new(&module, &bus);
        controller.runner.parallelize_collections = false;
        let summary = controller.find_and_run(&filters, &invoke);
        assert_eq!(summary.passed, 2);
        summary.results().map(|r| r.display_name.clone()).collect()
    };
    let first = run();
    let second = run();

    assert_eq!(first, second);
    assert_eq!(first, declared.iter().rev().cloned().collect::<Vec<_>>());
    assert!(first.iter().all(|name| name.starts_with("Ns.C.Theory(x: ")));
}
