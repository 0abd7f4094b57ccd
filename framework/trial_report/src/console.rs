//! Human-readable progress on a text stream.
//!
//! Failures, skips, diagnostics and cleanup failures are always printed;
//! passes and not-run tests only when verbose. Each assembly ends with one
//! summary line. Display names come from the metadata cache, so messages
//! only need IDs.

use std::fmt;
use std::io::{self, Write};

use parking_lot::Mutex;
use trial_messages::{Message, MessageSink, Metadata, MetadataCache};

pub struct ConsoleReporter {
    out: Mutex<Box<dyn Write + Send>>,
    metadata: MetadataCache,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(out: Box<dyn Write + Send>, verbose: bool) -> Self {
        ConsoleReporter {
            out: Mutex::new(out),
            metadata: MetadataCache::new(),
            verbose,
        }
    }

    pub fn stdout(verbose: bool) -> Self {
        ConsoleReporter::new(Box::new(io::stdout()), verbose)
    }

    fn line(&self, args: fmt::Arguments<'_>) {
        let mut out = self.out.lock();
        if let Err(e) = writeln!(out, "{args}") {
            tracing::warn!("console reporter could not write: {e}");
        }
    }

    fn flush(&self) {
        if let Err(e) = self.out.lock().flush() {
            tracing::warn!("console reporter could not flush: {e}");
        }
    }
}

fn name(metadata: Option<&Metadata>) -> &str {
    metadata.map_or("<unknown>", Metadata::display_name)
}

impl MessageSink for ConsoleReporter {
    fn on_message(&self, message: &Message) {
        // A duplicate ID means correlation is broken for the whole run.
        let metadata = match self.metadata.track(message) {
            Ok(metadata) => metadata,
            Err(error) => panic!("message correlation failed: {error}"),
        };
        let metadata = metadata.as_ref();

        match message {
            Message::Diagnostic { message, .. } => self.line(format_args!("  WARN: {message}")),
            Message::AssemblyStarting { assembly_name, .. } if self.verbose => {
                self.line(format_args!("Running {assembly_name}"));
            }
            Message::TestPassed { time, .. } if self.verbose => {
                self.line(format_args!("  PASS: {} ({time:.2?})", name(metadata)));
            }
            Message::TestFailed {
                message, output, ..
            } => {
                self.line(format_args!("  FAIL: {} - {message}", name(metadata)));
                for output_line in output.lines() {
                    self.line(format_args!("    | {output_line}"));
                }
            }
            Message::TestSkipped { reason, .. } => {
                self.line(format_args!("  SKIP: {} - {reason}", name(metadata)));
            }
            Message::TestNotRun { .. } if self.verbose => {
                self.line(format_args!("  NOT RUN: {}", name(metadata)));
            }
            Message::CleanupFailure { scope, message, .. } => {
                self.line(format_args!(
                    "  CLEANUP FAILURE ({scope:?}) {}: {message}",
                    name(metadata)
                ));
            }
            Message::AssemblyFinished { ids, totals } => {
                self.line(format_args!(
                    "{}: {} passed, {} failed, {} skipped, {} not run ({} total) in {:.2?}",
                    name(metadata),
                    totals.passed(),
                    totals.failed,
                    totals.skipped,
                    totals.not_run,
                    totals.total,
                    totals.time
                ));
                self.flush();
                // Finished assemblies only read, so release the entry here.
                if let Some(assembly) = &ids.assembly {
                    self.metadata.try_remove(assembly);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleReporter")
            .field("verbose", &self.verbose)
            .field("tracked", &self.metadata.len())
            .finish_non_exhaustive()
    }
}
