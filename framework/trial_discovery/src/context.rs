//! Everything a discovery strategy needs to turn one method into units.

use std::sync::Arc;

use trial_ir::unique_id;
use trial_ir::{DataRow, TestMethod, TestUnit, Traits, UnitKind};

use crate::diagnostics::Diagnostics;
use crate::display;
use crate::options::DiscoveryOptions;
use crate::source::TestMarker;

/// One marked method, ready for a [`TestCaseDiscoverer`](crate::TestCaseDiscoverer).
#[derive(Debug)]
pub struct MethodContext<'a> {
    pub method: Arc<TestMethod>,
    pub marker: &'a TestMarker,
    pub options: &'a DiscoveryOptions,
    diagnostics: &'a Diagnostics<'a>,
    /// Assembly, class and method traits.
    traits: Traits,
    base_name: String,
}

impl<'a> MethodContext<'a> {
    pub fn new(
        method: Arc<TestMethod>,
        marker: &'a TestMarker,
        options: &'a DiscoveryOptions,
        diagnostics: &'a Diagnostics<'a>,
    ) -> Self {
        let class = &method.class;
        let traits = Traits::union([
            &class.collection.assembly.traits,
            &class.traits,
            &method.traits,
        ]);
        let base_name = display::base_name(&method, marker, options.method_display);
        MethodContext {
            method,
            marker,
            options,
            diagnostics,
            traits,
            base_name,
        }
    }

    /// `Class.Method`, as used in diagnostics.
    pub fn qualified_name(&self) -> String {
        self.method.qualified_name()
    }

    pub fn report(&self, message: String) {
        self.diagnostics.report(message);
    }

    /// A unit standing for the whole method.
    pub fn single_unit(&self, kind: UnitKind, skip_reason: Option<String>) -> TestUnit {
        TestUnit {
            unique_id: unique_id::for_test_case(&self.method.unique_id, None),
            display_name: self.base_name.clone(),
            method: Arc::clone(&self.method),
            skip_reason,
            traits: self.traits.clone(),
            arguments: None,
            serialized_arguments: None,
            kind,
        }
    }

    /// A unit that fails with `message` instead of running the method.
    #[cold]
    pub fn error_unit(&self, message: impl Into<String>) -> TestUnit {
        self.single_unit(
            UnitKind::ExecutionError {
                message: message.into(),
            },
            None,
        )
    }

    /// A pre-enumerated theory row.
    pub fn row_unit(&self, row: DataRow, serialized: String) -> TestUnit {
        let display_name = match &row.display_name {
            Some(name) => name.clone(),
            None => display::format_arguments(
                &self.base_name,
                &self.method.parameters,
                &row.arguments,
            ),
        };
        let mut traits = self.traits.clone();
        traits.merge(&row.traits);
        TestUnit {
            unique_id: unique_id::for_test_case(&self.method.unique_id, Some(&serialized)),
            display_name,
            method: Arc::clone(&self.method),
            skip_reason: row.skip.or_else(|| self.method.skip.clone()),
            traits,
            arguments: Some(row.arguments),
            serialized_arguments: Some(serialized),
            kind: UnitKind::TheoryRow,
        }
    }
}
