//! Test scheduler: runs discovered units and publishes their lifecycle.
//!
//! Units are grouped by assembly, collection, class and method, each level
//! ordered by the configured orderer. Parallelizable collections run
//! concurrently on a scoped rayon pool bounded by [`MaxThreads`]; the rest
//! run one at a time afterwards. Within a collection everything is
//! sequential.
//!
//! [`MaxThreads`]: crate::MaxThreads

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use trial_discovery::{format_arguments, panic_message};
use trial_ir::{unique_id, DataError, DataRow, TestUnit, UniqueId, UnitKind, Value};
use trial_messages::{CleanupScope, Correlation, ExecutionTotals, Message, MessageBus};

use crate::cancel::CancellationToken;
use crate::config::RunnerConfig;
use crate::invoker::{HookPhase, Invocation, InvocationOutcome, Invoker};
use crate::plan::{self, AssemblyGroup, ClassGroup, CollectionGroup, MethodGroup};
use crate::summary::{CollectionSummary, RunSummary, TestResult};

/// What to do with one test.
#[derive(Debug)]
enum Action {
    NotRun,
    Skip(String),
    /// Fail without invoking.
    Fail(String),
    Invoke(Vec<Value>),
}

#[derive(Debug)]
struct PlannedTest {
    unique_id: UniqueId,
    display_name: String,
    action: Action,
}

/// Run `f`, turning a panic into its message.
fn guarded<R>(f: impl FnOnce() -> R) -> Result<R, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

pub struct TestScheduler<'a, I: Invoker + ?Sized> {
    config: &'a RunnerConfig,
    invoker: &'a I,
    bus: &'a MessageBus,
    token: CancellationToken,
}

impl<'a, I: Invoker + ?Sized> TestScheduler<'a, I> {
    pub fn new(config: &'a RunnerConfig, invoker: &'a I, bus: &'a MessageBus) -> Self {
        TestScheduler {
            config,
            invoker,
            bus,
            token: CancellationToken::new(),
        }
    }

    /// Share an externally owned token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    /// Run every unit and return the aggregated results.
    #[tracing::instrument(level = "debug", skip_all, fields(units = units.len()))]
    pub fn run(&self, units: Vec<TestUnit>) -> RunSummary {
        let mut summary = RunSummary::new();
        for mut assembly in plan::group(units) {
            plan::order(&mut assembly, &self.config.ordering);
            for collection in self.run_assembly(assembly) {
                summary.add_collection(collection);
            }
        }
        summary
    }

    fn run_assembly(&self, group: AssemblyGroup) -> Vec<CollectionSummary> {
        let assembly = &group.assembly;
        let ids = Correlation::assembly(&assembly.unique_id);
        self.bus.publish(&Message::AssemblyStarting {
            ids: ids.clone(),
            assembly_name: assembly.name.clone(),
            assembly_path: assembly.path.clone(),
            config_path: assembly.config_path.clone(),
        });

        let (parallel, serial): (Vec<_>, Vec<_>) = group.collections.into_iter().partition(|c| {
            self.config.parallelize_collections && !c.collection.disable_parallelization
        });
        let mut summaries = self.run_parallel(&parallel);
        summaries.extend(serial.iter().map(|c| self.run_collection(c)));

        let mut totals = ExecutionTotals::default();
        for summary in &summaries {
            totals.add(&summary.totals());
        }
        self.bus.publish(&Message::AssemblyFinished { ids, totals });
        summaries
    }

    fn run_parallel(&self, groups: &[CollectionGroup]) -> Vec<CollectionSummary> {
        if groups.len() < 2 {
            return groups.iter().map(|c| self.run_collection(c)).collect();
        }

        let threads = self.config.max_parallel_threads.thread_count(groups.len());
        tracing::debug!(collections = groups.len(), threads, "running collections in parallel");
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    groups
                        .par_iter()
                        .map(|c| self.run_collection(c))
                        .collect::<Vec<_>>()
                })
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create thread pool ({e}), running sequentially");
                groups.iter().map(|c| self.run_collection(c)).collect()
            })
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(collection = %group.collection.display_name, units = group.unit_count())
    )]
    fn run_collection(&self, group: &CollectionGroup) -> CollectionSummary {
        let collection = &group.collection;
        let ids = Correlation::assembly(&collection.assembly.unique_id)
            .with_collection(&collection.unique_id);
        self.bus.publish(&Message::CollectionStarting {
            ids: ids.clone(),
            display_name: collection.display_name.clone(),
        });
        let mut summary = CollectionSummary::new(collection.display_name.as_str());

        // Hooks only run when there is something left to run.
        let mut started = 0;
        let mut setup_failure = None;
        if !self.token.is_cancelled() {
            for hook in &collection.hooks {
                let outcome = guarded(|| self.invoker.run_hook(collection, hook, HookPhase::Before))
                    .and_then(|r| r);
                if let Err(error) = outcome {
                    setup_failure = Some(format!("Collection hook '{hook}' failed: {error}"));
                    break;
                }
                started += 1;
            }
        }

        let mut totals = ExecutionTotals::default();
        for class in &group.classes {
            totals.add(&self.run_class(&ids, class, setup_failure.as_deref(), &mut summary));
        }

        for hook in collection.hooks[..started].iter().rev() {
            let outcome = guarded(|| self.invoker.run_hook(collection, hook, HookPhase::After))
                .and_then(|r| r);
            if let Err(error) = outcome {
                let message = format!("Collection hook '{hook}' failed: {error}");
                tracing::warn!(collection = %collection.display_name, "{message}");
                self.bus.publish(&Message::CleanupFailure {
                    ids: ids.clone(),
                    scope: CleanupScope::Collection,
                    message: message.clone(),
                });
                summary.add_error(message);
            }
        }

        self.bus.publish(&Message::CollectionFinished { ids, totals });
        summary
    }

    fn run_class(
        &self,
        ids: &Correlation,
        group: &ClassGroup,
        setup_failure: Option<&str>,
        summary: &mut CollectionSummary,
    ) -> ExecutionTotals {
        let ids = ids.clone().with_class(&group.class.unique_id);
        self.bus.publish(&Message::ClassStarting {
            ids: ids.clone(),
            class_name: group.class.name.clone(),
        });
        let mut totals = ExecutionTotals::default();
        for method in &group.methods {
            totals.add(&self.run_method(&ids, method, setup_failure, summary));
        }
        self.bus.publish(&Message::ClassFinished { ids, totals });
        totals
    }

    fn run_method(
        &self,
        ids: &Correlation,
        group: &MethodGroup,
        setup_failure: Option<&str>,
        summary: &mut CollectionSummary,
    ) -> ExecutionTotals {
        let ids = ids.clone().with_method(&group.method.unique_id);
        self.bus.publish(&Message::MethodStarting {
            ids: ids.clone(),
            method_name: group.method.name.clone(),
        });
        let mut totals = ExecutionTotals::default();
        for unit in &group.units {
            totals.add(&self.run_test_case(&ids, unit, setup_failure, summary));
        }
        self.bus.publish(&Message::MethodFinished { ids, totals });
        totals
    }

    fn run_test_case(
        &self,
        ids: &Correlation,
        unit: &TestUnit,
        setup_failure: Option<&str>,
        summary: &mut CollectionSummary,
    ) -> ExecutionTotals {
        let ids = ids.clone().with_test_case(&unit.unique_id);
        self.bus.publish(&Message::TestCaseStarting {
            ids: ids.clone(),
            display_name: unit.display_name.clone(),
            skip_reason: unit.skip_reason.clone(),
            traits: unit.traits.clone(),
        });
        let mut totals = ExecutionTotals::default();
        for test in self.plan_tests(unit, setup_failure) {
            let result = self.run_test(&ids, unit, test);
            totals.add(&result.totals());
            summary.add_result(result);
        }
        self.bus.publish(&Message::TestCaseFinished { ids, totals });
        totals
    }

    /// Expand one unit into the tests it stands for.
    fn plan_tests(&self, unit: &TestUnit, setup_failure: Option<&str>) -> Vec<PlannedTest> {
        let single = |action: Action| {
            vec![PlannedTest {
                unique_id: unique_id::for_test(&unit.unique_id, 0),
                display_name: unit.display_name.clone(),
                action,
            }]
        };

        if self.token.is_cancelled() {
            return single(Action::NotRun);
        }
        if let Some(reason) = &unit.skip_reason {
            return single(Action::Skip(reason.clone()));
        }
        if let UnitKind::ExecutionError { message } = &unit.kind {
            return single(Action::Fail(message.clone()));
        }
        if let Some(failure) = setup_failure {
            return single(Action::Fail(failure.to_string()));
        }

        match &unit.kind {
            UnitKind::Fact => single(Action::Invoke(Vec::new())),
            UnitKind::TheoryRow => {
                single(Action::Invoke(unit.arguments.clone().unwrap_or_default()))
            }
            UnitKind::DelayedTheory { skip_if_no_data } => match fetch_rows(unit) {
                Err(message) => single(Action::Fail(message)),
                Ok(rows) if rows.is_empty() => {
                    let message = format!("No data found for {}", unit.method.qualified_name());
                    single(if *skip_if_no_data {
                        Action::Skip(message)
                    } else {
                        Action::Fail(message)
                    })
                }
                Ok(rows) => rows
                    .into_iter()
                    .enumerate()
                    .map(|(index, row)| row_test(unit, index, row))
                    .collect(),
            },
            UnitKind::ExecutionError { message } => single(Action::Fail(message.clone())),
        }
    }

    fn run_test(&self, ids: &Correlation, unit: &TestUnit, test: PlannedTest) -> TestResult {
        let ids = ids.clone().with_test(&test.unique_id);
        self.bus.publish(&Message::TestStarting {
            ids: ids.clone(),
            display_name: test.display_name.clone(),
        });

        // Cancellation can arrive between tests of one delayed theory.
        let action = match test.action {
            Action::Invoke(_) if self.token.is_cancelled() => Action::NotRun,
            action => action,
        };
        let result = match action {
            Action::NotRun => {
                self.bus.publish(&Message::TestNotRun { ids: ids.clone() });
                TestResult::not_run(test.unique_id, test.display_name)
            }
            Action::Skip(reason) => {
                self.bus.publish(&Message::TestSkipped {
                    ids: ids.clone(),
                    reason: reason.clone(),
                });
                TestResult::skipped(test.unique_id, test.display_name, reason)
            }
            Action::Fail(message) => {
                self.bus.publish(&Message::TestFailed {
                    ids: ids.clone(),
                    time: Duration::ZERO,
                    output: String::new(),
                    message: message.clone(),
                });
                TestResult::failed(test.unique_id, test.display_name, message, Duration::ZERO)
            }
            Action::Invoke(arguments) => {
                let invocation = self.invoke(unit, &arguments);
                self.publish_invocation(&ids, &invocation);
                let Invocation {
                    outcome, duration, ..
                } = invocation;
                match outcome {
                    InvocationOutcome::Passed => {
                        TestResult::passed(test.unique_id, test.display_name, duration)
                    }
                    InvocationOutcome::Failed(message) => {
                        TestResult::failed(test.unique_id, test.display_name, message, duration)
                    }
                    InvocationOutcome::Skipped(reason) => {
                        TestResult::skipped(test.unique_id, test.display_name, reason)
                    }
                }
            }
        };

        self.bus.publish(&Message::TestFinished {
            ids,
            time: result.duration,
        });
        if result.outcome.is_failed() && self.config.stop_on_fail && !self.token.is_cancelled() {
            tracing::debug!(test = %result.display_name, "stopping after first failure");
            self.token.cancel();
        }
        result
    }

    fn invoke(&self, unit: &TestUnit, arguments: &[Value]) -> Invocation {
        let start = Instant::now();
        guarded(|| self.invoker.invoke(unit, arguments))
            .unwrap_or_else(|message| Invocation::failed(message, start.elapsed()))
    }

    fn publish_invocation(&self, ids: &Correlation, invocation: &Invocation) {
        let message = match &invocation.outcome {
            InvocationOutcome::Passed => Message::TestPassed {
                ids: ids.clone(),
                time: invocation.duration,
                output: invocation.output.clone(),
            },
            InvocationOutcome::Failed(failure) => Message::TestFailed {
                ids: ids.clone(),
                time: invocation.duration,
                output: invocation.output.clone(),
                message: failure.clone(),
            },
            InvocationOutcome::Skipped(reason) => Message::TestSkipped {
                ids: ids.clone(),
                reason: reason.clone(),
            },
        };
        self.bus.publish(&message);
    }
}

/// Rows of a delayed theory, fetched now from every data source in order.
fn fetch_rows(unit: &TestUnit) -> Result<Vec<DataRow>, String> {
    let method = &unit.method;
    let mut rows = Vec::new();
    for source in &method.data_sources {
        match guarded(|| source.rows()) {
            Ok(Ok(batch)) => rows.extend(batch),
            Ok(Err(DataError::Null)) => {
                return Err(format!(
                    "Test data returned null for {} from data source '{}'. Make sure it is statically initialized before this test method is called.",
                    method.qualified_name(),
                    source.name()
                ));
            }
            Ok(Err(DataError::Failed(error))) | Err(error) => {
                return Err(format!(
                    "Exception thrown fetching data for {} from data source '{}': {error}",
                    method.qualified_name(),
                    source.name()
                ));
            }
        }
    }
    Ok(rows)
}

fn row_test(unit: &TestUnit, index: usize, row: DataRow) -> PlannedTest {
    let display_name = row.display_name.clone().unwrap_or_else(|| {
        format_arguments(&unit.display_name, &unit.method.parameters, &row.arguments)
    });
    PlannedTest {
        unique_id: unique_id::for_test(&unit.unique_id, index),
        display_name,
        action: match row.skip {
            Some(reason) => Action::Skip(reason),
            None => Action::Invoke(row.arguments),
        },
    }
}
