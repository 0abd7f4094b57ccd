//! Trial Report - message sinks that present results.
//!
//! - [`ConsoleReporter`]: human-readable progress and per-assembly totals
//! - [`BatchingReporter`]: queues per-test records to a background worker
//!   that ships them through a [`BatchTransport`]
//!
//! Reporters receive messages on whichever thread publishes them, possibly
//! several at once. Both adapters are safe to attach to a shared bus.

mod batching;
mod console;
mod transport;

pub use batching::BatchingReporter;
pub use console::ConsoleReporter;
pub use transport::{BatchTransport, RecordOutcome, RemoteId, RunId, TestRecord, TransportError};
