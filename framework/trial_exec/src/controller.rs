//! Front controller: discover, filter and run in one call.

use trial_discovery::{Discoverer, DiscoveryOptions, MemberEnumerator};
use trial_filter::TestFilters;
use trial_ir::TestUnit;
use trial_messages::MessageBus;

use crate::config::RunnerConfig;
use crate::invoker::Invoker;
use crate::scheduler::TestScheduler;
use crate::summary::RunSummary;

pub struct FrontController<'a> {
    enumerator: &'a dyn MemberEnumerator,
    bus: &'a MessageBus,
    /// Options for every discovery pass.
    pub discovery: DiscoveryOptions,
    /// Configuration for every run.
    pub runner: RunnerConfig,
}

impl<'a> FrontController<'a> {
    pub fn new(enumerator: &'a dyn MemberEnumerator, bus: &'a MessageBus) -> Self {
        FrontController {
            enumerator,
            bus,
            discovery: DiscoveryOptions::default(),
            runner: RunnerConfig::default(),
        }
    }

    /// Every unit in the module, with diagnostics published on the bus.
    pub fn discover(&self) -> Vec<TestUnit> {
        Discoverer::new(self.enumerator, self.discovery)
            .with_bus(self.bus)
            .discover_all()
    }

    /// Discover, keep the units `filters` pass, and run them.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn find_and_run<I: Invoker + ?Sized>(
        &self,
        filters: &TestFilters,
        invoker: &I,
    ) -> RunSummary {
        let discovered = self.discover();
        let total = discovered.len();
        let selected: Vec<TestUnit> = discovered
            .into_iter()
            .filter(|unit| filters.passes(unit))
            .collect();
        tracing::debug!(total, selected = selected.len(), "filtered discovered units");
        TestScheduler::new(&self.runner, invoker, self.bus).run(selected)
    }
}

impl std::fmt::Debug for FrontController<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontController")
            .field("discovery", &self.discovery)
            .field("runner", &self.runner)
            .finish_non_exhaustive()
    }
}
