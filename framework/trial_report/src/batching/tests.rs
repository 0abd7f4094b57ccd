use std::time::Duration;

use super::*;
use pretty_assertions::assert_eq;
use trial_ir::unique_id;
use trial_messages::Correlation;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Start,
    Add(Vec<String>),
    Update(Vec<(u64, String, RecordOutcome)>),
    Finish,
}

struct RecordingTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    next_id: u64,
    fail_adds: bool,
}

impl RecordingTransport {
    fn new(fail_adds: bool) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let transport = RecordingTransport {
            calls: Arc::clone(&calls),
            next_id: 100,
            fail_adds,
        };
        (transport, calls)
    }
}

impl BatchTransport for RecordingTransport {
    fn start_run(&mut self) -> Result<RunId, TransportError> {
        self.calls.lock().push(Call::Start);
        Ok(RunId(1))
    }

    fn add_tests(
        &mut self,
        _run: RunId,
        tests: &[TestRecord],
    ) -> Result<Vec<RemoteId>, TransportError> {
        if self.fail_adds {
            return Err(TransportError::Rejected { status: 500 });
        }
        self.calls.lock().push(Call::Add(
            tests
                .iter()
                .map(|t| t.display_name.clone().unwrap_or_default())
                .collect(),
        ));
        Ok(tests
            .iter()
            .map(|_| {
                self.next_id += 1;
                RemoteId(self.next_id)
            })
            .collect())
    }

    fn update_tests(
        &mut self,
        _run: RunId,
        updates: &[(RemoteId, TestRecord)],
    ) -> Result<(), TransportError> {
        self.calls.lock().push(Call::Update(
            updates
                .iter()
                .map(|(id, record)| {
                    (
                        id.0,
                        record.message.clone().unwrap_or_default(),
                        record.outcome.unwrap_or(RecordOutcome::NotRun),
                    )
                })
                .collect(),
        ));
        Ok(())
    }

    fn finish_run(&mut self, _run: RunId) -> Result<(), TransportError> {
        self.calls.lock().push(Call::Finish);
        Ok(())
    }
}

fn ids(name: &str) -> Correlation {
    Correlation::assembly(&unique_id::hash(["asm"])).with_test(&unique_id::hash([name]))
}

fn run_one(reporter: &BatchingReporter, name: &str, failed: bool) {
    reporter.on_message(&Message::TestStarting {
        ids: ids(name),
        display_name: name.to_string(),
    });
    let result = if failed {
        Message::TestFailed {
            ids: ids(name),
            time: Duration::from_millis(3),
            output: String::new(),
            message: format!("{name} broke"),
        }
    } else {
        Message::TestPassed {
            ids: ids(name),
            time: Duration::from_millis(3),
            output: "ok".into(),
        }
    };
    reporter.on_message(&result);
    reporter.on_message(&Message::TestFinished {
        ids: ids(name),
        time: Duration::from_millis(3),
    });
}

#[test]
fn test_adds_precede_updates_and_carry_remote_ids() {
    let (transport, calls) = RecordingTransport::new(false);
    let reporter = BatchingReporter::new(transport).unwrap();
    run_one(&reporter, "A", false);
    run_one(&reporter, "B", true);
    reporter.finish();

    let calls = calls.lock().clone();
    assert_eq!(calls.first(), Some(&Call::Start));
    assert_eq!(calls.last(), Some(&Call::Finish));

    let mut added: Vec<String> = Vec::new();
    let mut updated: Vec<(u64, String, RecordOutcome)> = Vec::new();
    for call in &calls {
        match call {
            Call::Add(names) => added.extend(names.iter().cloned()),
            Call::Update(records) => {
                // Every update refers to a test added by an earlier call.
                for (id, _, _) in records {
                    assert!(*id > 100 && *id <= 100 + added.len() as u64);
                }
                updated.extend(records.iter().cloned());
            }
            Call::Start | Call::Finish => {}
        }
    }
    assert_eq!(added, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(updated.len(), 2);
    assert_eq!(updated[0].2, RecordOutcome::Passed);
    assert_eq!(updated[1], (102, "B broke".to_string(), RecordOutcome::Failed));
    assert!(!reporter.has_failed());
}

#[test]
fn test_first_failure_stops_sending() {
    let (transport, calls) = RecordingTransport::new(true);
    let reporter = BatchingReporter::new(transport).unwrap();
    run_one(&reporter, "A", false);
    reporter.finish();
    assert!(reporter.has_failed());

    // Queue more after the failure; nothing else reaches the transport.
    run_one(&reporter, "B", false);
    assert_eq!(*calls.lock(), vec![Call::Start, Call::Finish]);
}

#[test]
fn test_non_test_messages_are_ignored() {
    let (transport, calls) = RecordingTransport::new(false);
    let reporter = BatchingReporter::new(transport).unwrap();
    reporter.on_message(&Message::Diagnostic {
        ids: Correlation::default(),
        message: "hello".into(),
    });
    reporter.on_message(&Message::TestNotRun {
        ids: Correlation::default(),
    });
    reporter.finish();
    assert_eq!(*calls.lock(), vec![Call::Start, Call::Finish]);
}

#[test]
fn test_drop_flushes_and_finish_is_idempotent() {
    let (transport, calls) = RecordingTransport::new(false);
    {
        let reporter = BatchingReporter::new(transport).unwrap();
        run_one(&reporter, "A", false);
        reporter.finish();
        reporter.finish();
    }
    let calls = calls.lock().clone();
    assert_eq!(calls.iter().filter(|c| **c == Call::Finish).count(), 1);

    let (transport, calls) = RecordingTransport::new(false);
    {
        let reporter = BatchingReporter::new(transport).unwrap();
        run_one(&reporter, "A", false);
    }
    assert_eq!(calls.lock().last(), Some(&Call::Finish));
}

#[test]
fn test_concurrent_producers() {
    let (transport, calls) = RecordingTransport::new(false);
    let reporter = BatchingReporter::new(transport).unwrap();
    std::thread::scope(|scope| {
        for t in 0..4 {
            let reporter = &reporter;
            scope.spawn(move || {
                for i in 0..25 {
                    run_one(reporter, &format!("T{t}-{i}"), false);
                }
            });
        }
    });
    reporter.finish();

    let calls = calls.lock().clone();
    let added: usize = calls
        .iter()
        .map(|c| match c {
            Call::Add(names) => names.len(),
            _ => 0,
        })
        .sum();
    let updated: usize = calls
        .iter()
        .map(|c| match c {
            Call::Update(records) => records.len(),
            _ => 0,
        })
        .sum();
    assert_eq!(added, 100);
    assert_eq!(updated, 100);
}
