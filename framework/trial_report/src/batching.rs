//! Batching reporter: test records shipped from a background worker.
//!
//! Message handlers only enqueue. The worker drains everything queued since
//! its last wakeup, sends the adds first (updates need the remote IDs they
//! return) and the updates second. After the first transport failure the
//! worker stops sending for good but keeps draining, so producers never
//! block on a dead remote.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use trial_ir::UniqueId;
use trial_messages::{Message, MessageSink};

use crate::transport::{BatchTransport, RecordOutcome, RemoteId, RunId, TestRecord, TransportError};

enum WorkItem {
    Add(TestRecord),
    Update(TestRecord),
    Shutdown,
}

pub struct BatchingReporter {
    sender: Sender<WorkItem>,
    worker: Mutex<Option<JoinHandle<()>>>,
    failed: Arc<AtomicBool>,
}

impl BatchingReporter {
    /// Start the worker thread that owns `transport`.
    pub fn new<T: BatchTransport>(transport: T) -> std::io::Result<Self> {
        let (sender, receiver) = channel::unbounded();
        let failed = Arc::new(AtomicBool::new(false));
        let worker_failed = Arc::clone(&failed);
        let worker = thread::Builder::new()
            .name("trial-batch-reporter".to_string())
            .spawn(move || Worker::new(transport, worker_failed).run(&receiver))?;
        Ok(BatchingReporter {
            sender,
            worker: Mutex::new(Some(worker)),
            failed,
        })
    }

    /// Whether a transport call has failed. Once set, nothing more is sent.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// Flush everything queued so far, close the remote run and stop the
    /// worker. Later calls do nothing.
    pub fn finish(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        // A closed channel means the worker already exited.
        let _ = self.sender.send(WorkItem::Shutdown);
        if worker.join().is_err() {
            tracing::error!("batch reporter worker panicked");
            self.failed.store(true, Ordering::Release);
        }
    }

    fn enqueue(&self, item: WorkItem) {
        if self.sender.send(item).is_err() {
            tracing::debug!("batch reporter already finished; dropping record");
        }
    }
}

impl MessageSink for BatchingReporter {
    fn on_message(&self, message: &Message) {
        let Some(test) = message.ids().test.clone() else {
            return;
        };
        let item = match message {
            Message::TestStarting { display_name, .. } => {
                WorkItem::Add(TestRecord::added(test, display_name.clone()))
            }
            Message::TestPassed { time, output, .. } => WorkItem::Update(
                TestRecord::finished(test, RecordOutcome::Passed, *time)
                    .with_output(output.as_str()),
            ),
            Message::TestFailed {
                time,
                output,
                message,
                ..
            } => WorkItem::Update(
                TestRecord::finished(test, RecordOutcome::Failed, *time)
                    .with_message(message.as_str())
                    .with_output(output.as_str()),
            ),
            Message::TestSkipped { reason, .. } => WorkItem::Update(
                TestRecord::finished(test, RecordOutcome::Skipped, std::time::Duration::ZERO)
                    .with_message(reason.as_str()),
            ),
            Message::TestNotRun { .. } => WorkItem::Update(TestRecord::finished(
                test,
                RecordOutcome::NotRun,
                std::time::Duration::ZERO,
            )),
            _ => return,
        };
        self.enqueue(item);
    }
}

impl Drop for BatchingReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl std::fmt::Debug for BatchingReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchingReporter")
            .field("failed", &self.has_failed())
            .finish_non_exhaustive()
    }
}

struct Worker<T> {
    transport: T,
    failed: Arc<AtomicBool>,
    remote_ids: FxHashMap<UniqueId, RemoteId>,
}

impl<T: BatchTransport> Worker<T> {
    fn new(transport: T, failed: Arc<AtomicBool>) -> Self {
        Worker {
            transport,
            failed,
            remote_ids: FxHashMap::default(),
        }
    }

    fn run(mut self, receiver: &Receiver<WorkItem>) {
        let run = match self.transport.start_run() {
            Ok(run) => Some(run),
            Err(error) => {
                self.fail("could not create test run", &error);
                None
            }
        };

        let mut shutdown = false;
        while !shutdown {
            // All senders gone is as good as a shutdown request.
            let Ok(first) = receiver.recv() else {
                break;
            };
            let mut adds = Vec::new();
            let mut updates = Vec::new();
            for item in std::iter::once(first).chain(receiver.try_iter()) {
                match item {
                    WorkItem::Add(record) => adds.push(record),
                    WorkItem::Update(record) => updates.push(record),
                    WorkItem::Shutdown => shutdown = true,
                }
            }

            let Some(run) = run else { continue };
            if self.failed.load(Ordering::Acquire) {
                continue;
            }
            if let Err(error) = self.send(run, &adds, updates) {
                self.fail("could not send test results", &error);
            }
        }

        if let Some(run) = run {
            if let Err(error) = self.transport.finish_run(run) {
                self.fail("could not finish test run", &error);
            }
        }
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(adds = adds.len(), updates = updates.len())
    )]
    fn send(
        &mut self,
        run: RunId,
        adds: &[TestRecord],
        updates: Vec<TestRecord>,
    ) -> Result<(), TransportError> {
        if !adds.is_empty() {
            let ids = self.transport.add_tests(run, adds)?;
            if ids.len() != adds.len() {
                return Err(TransportError::MissingIds {
                    expected: adds.len(),
                    received: ids.len(),
                });
            }
            for (record, id) in adds.iter().zip(ids) {
                self.remote_ids.insert(record.unique_id.clone(), id);
            }
        }

        let mut resolved = Vec::with_capacity(updates.len());
        for record in updates {
            match self.remote_ids.get(&record.unique_id) {
                Some(id) => resolved.push((*id, record)),
                None => {
                    tracing::warn!(
                        test = %record.unique_id,
                        "update for a test that was never added"
                    );
                }
            }
        }
        if !resolved.is_empty() {
            self.transport.update_tests(run, &resolved)?;
        }
        Ok(())
    }

    #[cold]
    fn fail(&self, context: &str, error: &TransportError) {
        tracing::error!("{context}: {error}");
        self.failed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
