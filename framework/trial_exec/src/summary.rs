//! Test result types.

use std::time::Duration;

use trial_ir::UniqueId;
use trial_messages::ExecutionTotals;

/// Outcome of a single test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    /// Failed with a message.
    Failed(String),
    /// Skipped with a reason.
    Skipped(String),
    /// Never dispatched because the run was cancelled.
    NotRun,
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TestOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TestOutcome::Skipped(_))
    }

    pub fn is_not_run(&self) -> bool {
        matches!(self, TestOutcome::NotRun)
    }
}

/// Result of running a single test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestResult {
    pub unique_id: UniqueId,
    pub display_name: String,
    pub outcome: TestOutcome,
    pub duration: Duration,
}

impl TestResult {
    pub fn passed(unique_id: UniqueId, display_name: String, duration: Duration) -> Self {
        TestResult {
            unique_id,
            display_name,
            outcome: TestOutcome::Passed,
            duration,
        }
    }

    #[cold]
    pub fn failed(
        unique_id: UniqueId,
        display_name: String,
        message: String,
        duration: Duration,
    ) -> Self {
        TestResult {
            unique_id,
            display_name,
            outcome: TestOutcome::Failed(message),
            duration,
        }
    }

    #[cold]
    pub fn skipped(unique_id: UniqueId, display_name: String, reason: String) -> Self {
        TestResult {
            unique_id,
            display_name,
            outcome: TestOutcome::Skipped(reason),
            duration: Duration::ZERO,
        }
    }

    #[cold]
    pub fn not_run(unique_id: UniqueId, display_name: String) -> Self {
        TestResult {
            unique_id,
            display_name,
            outcome: TestOutcome::NotRun,
            duration: Duration::ZERO,
        }
    }

    /// Totals contributed by this one test.
    pub fn totals(&self) -> ExecutionTotals {
        ExecutionTotals {
            total: 1,
            failed: usize::from(self.outcome.is_failed()),
            skipped: usize::from(self.outcome.is_skipped()),
            not_run: usize::from(self.outcome.is_not_run()),
            time: self.duration,
        }
    }
}

/// Summary of test results for a single collection.
#[derive(Clone, Debug, Default)]
pub struct CollectionSummary {
    pub display_name: String,
    /// Individual results in execution order.
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
    /// Sum of test durations.
    pub duration: Duration,
    /// Hook and cleanup failures (not test failures).
    pub errors: Vec<String>,
}

impl CollectionSummary {
    pub fn new(display_name: impl Into<String>) -> Self {
        CollectionSummary {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn add_result(&mut self, result: TestResult) {
        match &result.outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed(_) => self.failed += 1,
            TestOutcome::Skipped(_) => self.skipped += 1,
            TestOutcome::NotRun => self.not_run += 1,
        }
        self.duration += result.duration;
        self.results.push(result);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.not_run
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || !self.errors.is_empty()
    }

    pub fn totals(&self) -> ExecutionTotals {
        ExecutionTotals {
            total: self.total(),
            failed: self.failed,
            skipped: self.skipped,
            not_run: self.not_run,
            time: self.duration,
        }
    }
}

/// Overall summary of a run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub collections: Vec<CollectionSummary>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
    /// Number of collections with hook or cleanup failures.
    pub error_collections: usize,
    /// Sum of test durations.
    pub duration: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        RunSummary::default()
    }

    pub fn add_collection(&mut self, summary: CollectionSummary) {
        self.passed += summary.passed;
        self.failed += summary.failed;
        self.skipped += summary.skipped;
        self.not_run += summary.not_run;
        if !summary.errors.is_empty() {
            self.error_collections += 1;
        }
        self.duration += summary.duration;
        self.collections.push(summary);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.not_run
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.error_collections > 0
    }

    /// Results of every collection, in execution order within each.
    pub fn results(&self) -> impl Iterator<Item = &TestResult> {
        self.collections.iter().flat_map(|c| c.results.iter())
    }

    /// Get exit code: 0 = all pass, 1 = failures, 2 = no tests ran.
    pub fn exit_code(&self) -> i32 {
        if self.total() == 0 && self.error_collections == 0 {
            2
        } else {
            i32::from(self.has_failures())
        }
    }
}

#[cfg(test)]
mod tests;
