//! Discovery strategies, selected by a method's marker.

use std::fmt;

use trial_ir::{TestUnit, UnitKind};

use crate::context::MethodContext;
use crate::source::MarkerKind;
use crate::theory::{self, TheoryDecision};

/// Turns one marked method into test units.
///
/// Implementations must not panic on bad input; problems that belong to the
/// method become error units via [`MethodContext::error_unit`].
pub trait TestCaseDiscoverer: Send + Sync + fmt::Debug {
    fn discover(&self, ctx: &MethodContext<'_>) -> Vec<TestUnit>;
}

/// Parameterless methods: exactly one unit.
#[derive(Clone, Copy, Debug, Default)]
pub struct FactDiscoverer;

impl TestCaseDiscoverer for FactDiscoverer {
    fn discover(&self, ctx: &MethodContext<'_>) -> Vec<TestUnit> {
        if !ctx.method.parameters.is_empty() {
            return vec![ctx.error_unit(
                "[Fact] methods are not allowed to have parameters. Did you mean to use [Theory]?",
            )];
        }
        vec![ctx.single_unit(UnitKind::Fact, ctx.method.skip.clone())]
    }
}

/// Data-driven methods.
#[derive(Clone, Copy, Debug, Default)]
pub struct TheoryDiscoverer;

impl TestCaseDiscoverer for TheoryDiscoverer {
    fn discover(&self, ctx: &MethodContext<'_>) -> Vec<TestUnit> {
        let skip_if_no_data = ctx.marker.skip_test_without_data;
        let delayed = UnitKind::DelayedTheory { skip_if_no_data };

        // A skipped theory never touches its data.
        if let Some(reason) = &ctx.method.skip {
            return vec![ctx.single_unit(delayed, Some(reason.clone()))];
        }

        match theory::decide(ctx) {
            TheoryDecision::PreEnumerated(rows) => rows
                .into_iter()
                .map(|(row, serialized)| ctx.row_unit(row, serialized))
                .collect(),
            TheoryDecision::Delayed(reason) => {
                tracing::debug!(method = %ctx.qualified_name(), ?reason, "theory delayed");
                vec![ctx.single_unit(delayed, None)]
            }
            TheoryDecision::NoData => {
                let message = format!("No data found for {}", ctx.qualified_name());
                if skip_if_no_data {
                    vec![ctx.single_unit(delayed, Some(message))]
                } else {
                    vec![ctx.error_unit(message)]
                }
            }
            TheoryDecision::NullData { source } => vec![ctx.error_unit(format!(
                "Test data returned null for {} from data source '{source}'. Make sure it is statically initialized before this test method is called.",
                ctx.qualified_name()
            ))],
        }
    }
}

static FACT: FactDiscoverer = FactDiscoverer;
static THEORY: TheoryDiscoverer = TheoryDiscoverer;

/// The strategy a marker selects.
pub fn strategy_for(kind: &MarkerKind) -> &dyn TestCaseDiscoverer {
    match kind {
        MarkerKind::Fact => &FACT,
        MarkerKind::Theory => &THEORY,
        MarkerKind::Custom(discoverer) => discoverer.as_ref(),
    }
}
