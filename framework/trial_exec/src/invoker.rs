//! The seam between the scheduler and whatever actually runs test code.

use std::time::Duration;

use trial_ir::{TestCollection, TestUnit, Value};

/// What the test body decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvocationOutcome {
    Passed,
    Failed(String),
    /// Skipped by the body itself at run time.
    Skipped(String),
}

/// Outcome of one invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub outcome: InvocationOutcome,
    pub duration: Duration,
    /// Captured output, possibly empty.
    pub output: String,
}

impl Invocation {
    pub fn passed(duration: Duration) -> Self {
        Invocation {
            outcome: InvocationOutcome::Passed,
            duration,
            output: String::new(),
        }
    }

    #[cold]
    pub fn failed(message: impl Into<String>, duration: Duration) -> Self {
        Invocation {
            outcome: InvocationOutcome::Failed(message.into()),
            duration,
            output: String::new(),
        }
    }

    #[cold]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Invocation {
            outcome: InvocationOutcome::Skipped(reason.into()),
            duration: Duration::ZERO,
            output: String::new(),
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn is_passed(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Passed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

/// Runs test bodies and collection hooks.
///
/// Called from scheduler worker threads; panics are caught by the caller
/// and reported as failures.
pub trait Invoker: Sync {
    fn invoke(&self, unit: &TestUnit, arguments: &[Value]) -> Invocation;

    fn run_hook(
        &self,
        _collection: &TestCollection,
        _hook: &str,
        _phase: HookPhase,
    ) -> Result<(), String> {
        Ok(())
    }
}

impl<F> Invoker for F
where
    F: Fn(&TestUnit, &[Value]) -> Invocation + Sync,
{
    fn invoke(&self, unit: &TestUnit, arguments: &[Value]) -> Invocation {
        self(unit, arguments)
    }
}
