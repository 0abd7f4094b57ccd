//! The remote side of a batching reporter.

use std::time::Duration;

use serde::Serialize;
use trial_ir::UniqueId;

/// Identifier of a remote test run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RunId(pub u64);

/// Identifier the remote side assigned to one added test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RemoteId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RecordOutcome {
    Passed,
    Failed,
    Skipped,
    NotRun,
}

/// One test as the remote side sees it. Adds carry a display name and no
/// outcome; updates carry the outcome.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    pub unique_id: UniqueId,
    pub display_name: Option<String>,
    pub outcome: Option<RecordOutcome>,
    pub duration: Duration,
    /// Failure message or skip reason.
    pub message: Option<String>,
    pub output: Option<String>,
}

impl TestRecord {
    pub fn added(unique_id: UniqueId, display_name: String) -> Self {
        TestRecord {
            unique_id,
            display_name: Some(display_name),
            outcome: None,
            duration: Duration::ZERO,
            message: None,
            output: None,
        }
    }

    pub fn finished(unique_id: UniqueId, outcome: RecordOutcome, duration: Duration) -> Self {
        TestRecord {
            unique_id,
            display_name: None,
            outcome: Some(outcome),
            duration,
            message: None,
            output: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        let output = output.into();
        if !output.is_empty() {
            self.output = Some(output);
        }
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request rejected with status {status}")]
    Rejected { status: u16 },
    #[error("expected {expected} remote ids, received {received}")]
    MissingIds { expected: usize, received: usize },
    #[error("{0}")]
    Failed(String),
}

/// Ships batches of test records somewhere.
///
/// Called only from the reporter's worker thread, one call at a time.
pub trait BatchTransport: Send + 'static {
    fn start_run(&mut self) -> Result<RunId, TransportError>;

    /// Register new tests. Returns one remote ID per record, in order.
    fn add_tests(&mut self, run: RunId, tests: &[TestRecord])
        -> Result<Vec<RemoteId>, TransportError>;

    fn update_tests(
        &mut self,
        run: RunId,
        updates: &[(RemoteId, TestRecord)],
    ) -> Result<(), TransportError>;

    fn finish_run(&mut self, run: RunId) -> Result<(), TransportError>;
}
