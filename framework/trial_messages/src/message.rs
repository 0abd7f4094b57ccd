//! Lifecycle messages.
//!
//! Every message carries a [`Correlation`] naming the entities it belongs to,
//! from the assembly down to the individual test. Messages are immutable
//! and serialize to JSON (tagged by kind) for external collaborators.

use std::time::Duration;

use serde::Serialize;
use trial_ir::{Traits, UniqueId};

/// Message discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MessageKind {
    DiscoveryStarting,
    DiscoveryComplete,
    Diagnostic,
    AssemblyStarting,
    AssemblyFinished,
    CollectionStarting,
    CollectionFinished,
    ClassStarting,
    ClassFinished,
    MethodStarting,
    MethodFinished,
    TestCaseStarting,
    TestCaseFinished,
    TestStarting,
    TestPassed,
    TestFailed,
    TestSkipped,
    TestNotRun,
    TestFinished,
    CleanupFailure,
}

impl MessageKind {
    pub const ALL: [MessageKind; 20] = [
        MessageKind::DiscoveryStarting,
        MessageKind::DiscoveryComplete,
        MessageKind::Diagnostic,
        MessageKind::AssemblyStarting,
        MessageKind::AssemblyFinished,
        MessageKind::CollectionStarting,
        MessageKind::CollectionFinished,
        MessageKind::ClassStarting,
        MessageKind::ClassFinished,
        MessageKind::MethodStarting,
        MessageKind::MethodFinished,
        MessageKind::TestCaseStarting,
        MessageKind::TestCaseFinished,
        MessageKind::TestStarting,
        MessageKind::TestPassed,
        MessageKind::TestFailed,
        MessageKind::TestSkipped,
        MessageKind::TestNotRun,
        MessageKind::TestFinished,
        MessageKind::CleanupFailure,
    ];

    /// Kinds reporting the outcome of a single test.
    pub fn is_test_result(self) -> bool {
        matches!(
            self,
            MessageKind::TestPassed
                | MessageKind::TestFailed
                | MessageKind::TestSkipped
                | MessageKind::TestNotRun
        )
    }
}

/// Correlation identifiers, outermost first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Correlation {
    pub assembly: Option<UniqueId>,
    pub collection: Option<UniqueId>,
    pub class: Option<UniqueId>,
    pub method: Option<UniqueId>,
    pub test_case: Option<UniqueId>,
    pub test: Option<UniqueId>,
}

impl Correlation {
    pub fn assembly(id: &UniqueId) -> Self {
        Correlation {
            assembly: Some(id.clone()),
            ..Correlation::default()
        }
    }

    #[must_use]
    pub fn with_collection(mut self, id: &UniqueId) -> Self {
        self.collection = Some(id.clone());
        self
    }

    #[must_use]
    pub fn with_class(mut self, id: &UniqueId) -> Self {
        self.class = Some(id.clone());
        self
    }

    #[must_use]
    pub fn with_method(mut self, id: &UniqueId) -> Self {
        self.method = Some(id.clone());
        self
    }

    #[must_use]
    pub fn with_test_case(mut self, id: &UniqueId) -> Self {
        self.test_case = Some(id.clone());
        self
    }

    #[must_use]
    pub fn with_test(mut self, id: &UniqueId) -> Self {
        self.test = Some(id.clone());
        self
    }

    /// Innermost identifier present.
    pub fn innermost(&self) -> Option<&UniqueId> {
        self.test
            .as_ref()
            .or(self.test_case.as_ref())
            .or(self.method.as_ref())
            .or(self.class.as_ref())
            .or(self.collection.as_ref())
            .or(self.assembly.as_ref())
    }
}

/// Aggregate counts carried by every "finished" message above the test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionTotals {
    pub total: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
    pub time: Duration,
}

impl ExecutionTotals {
    pub fn passed(&self) -> usize {
        self.total - self.failed - self.skipped - self.not_run
    }

    pub fn add(&mut self, other: &ExecutionTotals) {
        self.total += other.total;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.not_run += other.not_run;
        self.time += other.time;
    }
}

/// Entity level a cleanup failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CleanupScope {
    Assembly,
    Collection,
    Class,
    Method,
    TestCase,
    Test,
}

/// A lifecycle event.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Message {
    DiscoveryStarting {
        ids: Correlation,
        assembly_name: String,
    },
    DiscoveryComplete {
        ids: Correlation,
        test_cases: usize,
    },
    /// Non-fatal problem found during discovery or execution.
    Diagnostic {
        ids: Correlation,
        message: String,
    },
    AssemblyStarting {
        ids: Correlation,
        assembly_name: String,
        assembly_path: String,
        config_path: Option<String>,
    },
    AssemblyFinished {
        ids: Correlation,
        totals: ExecutionTotals,
    },
    CollectionStarting {
        ids: Correlation,
        display_name: String,
    },
    CollectionFinished {
        ids: Correlation,
        totals: ExecutionTotals,
    },
    ClassStarting {
        ids: Correlation,
        class_name: String,
    },
    ClassFinished {
        ids: Correlation,
        totals: ExecutionTotals,
    },
    MethodStarting {
        ids: Correlation,
        method_name: String,
    },
    MethodFinished {
        ids: Correlation,
        totals: ExecutionTotals,
    },
    TestCaseStarting {
        ids: Correlation,
        display_name: String,
        skip_reason: Option<String>,
        traits: Traits,
    },
    TestCaseFinished {
        ids: Correlation,
        totals: ExecutionTotals,
    },
    TestStarting {
        ids: Correlation,
        display_name: String,
    },
    TestPassed {
        ids: Correlation,
        time: Duration,
        output: String,
    },
    TestFailed {
        ids: Correlation,
        time: Duration,
        output: String,
        message: String,
    },
    TestSkipped {
        ids: Correlation,
        reason: String,
    },
    TestNotRun {
        ids: Correlation,
    },
    TestFinished {
        ids: Correlation,
        time: Duration,
    },
    CleanupFailure {
        ids: Correlation,
        scope: CleanupScope,
        message: String,
    },
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::DiscoveryStarting { .. } => MessageKind::DiscoveryStarting,
            Message::DiscoveryComplete { .. } => MessageKind::DiscoveryComplete,
            Message::Diagnostic { .. } => MessageKind::Diagnostic,
            Message::AssemblyStarting { .. } => MessageKind::AssemblyStarting,
            Message::AssemblyFinished { .. } => MessageKind::AssemblyFinished,
            Message::CollectionStarting { .. } => MessageKind::CollectionStarting,
            Message::CollectionFinished { .. } => MessageKind::CollectionFinished,
            Message::ClassStarting { .. } => MessageKind::ClassStarting,
            Message::ClassFinished { .. } => MessageKind::ClassFinished,
            Message::MethodStarting { .. } => MessageKind::MethodStarting,
            Message::MethodFinished { .. } => MessageKind::MethodFinished,
            Message::TestCaseStarting { .. } => MessageKind::TestCaseStarting,
            Message::TestCaseFinished { .. } => MessageKind::TestCaseFinished,
            Message::TestStarting { .. } => MessageKind::TestStarting,
            Message::TestPassed { .. } => MessageKind::TestPassed,
            Message::TestFailed { .. } => MessageKind::TestFailed,
            Message::TestSkipped { .. } => MessageKind::TestSkipped,
            Message::TestNotRun { .. } => MessageKind::TestNotRun,
            Message::TestFinished { .. } => MessageKind::TestFinished,
            Message::CleanupFailure { .. } => MessageKind::CleanupFailure,
        }
    }

    pub fn ids(&self) -> &Correlation {
        match self {
            Message::DiscoveryStarting { ids, .. }
            | Message::DiscoveryComplete { ids, .. }
            | Message::Diagnostic { ids, .. }
            | Message::AssemblyStarting { ids, .. }
            | Message::AssemblyFinished { ids, .. }
            | Message::CollectionStarting { ids, .. }
            | Message::CollectionFinished { ids, .. }
            | Message::ClassStarting { ids, .. }
            | Message::ClassFinished { ids, .. }
            | Message::MethodStarting { ids, .. }
            | Message::MethodFinished { ids, .. }
            | Message::TestCaseStarting { ids, .. }
            | Message::TestCaseFinished { ids, .. }
            | Message::TestStarting { ids, .. }
            | Message::TestPassed { ids, .. }
            | Message::TestFailed { ids, .. }
            | Message::TestSkipped { ids, .. }
            | Message::TestNotRun { ids }
            | Message::TestFinished { ids, .. }
            | Message::CleanupFailure { ids, .. } => ids,
        }
    }

    /// Encode for an out-of-process consumer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
