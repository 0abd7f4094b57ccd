//! Test hierarchy: assembly, collection, class, method and unit.
//!
//! Everything here is immutable once discovery has built it. Parents are
//! shared through `Arc` so a unit can reach its method, class, collection and
//! assembly without lookups.

use std::sync::Arc;

use crate::unique_id::{self, UniqueId};
use crate::{DataSource, Traits, Value};

/// Ordering strategy selectable per granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OrdererKind {
    /// Stable-random: sorted by a salted digest of each unique ID.
    #[default]
    Default,
    /// Input order.
    Unordered,
}

/// The module under test.
#[derive(Clone, Debug)]
pub struct TestAssembly {
    pub unique_id: UniqueId,
    /// Simple name, used for per-assembly collections and query filters.
    pub name: String,
    pub path: String,
    pub config_path: Option<String>,
    /// Applied to every unit in the assembly.
    pub traits: Traits,
    /// Hooks merged into every collection.
    pub hooks: Vec<String>,
}

impl TestAssembly {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        config_path: Option<String>,
    ) -> Self {
        let path = path.into();
        TestAssembly {
            unique_id: unique_id::for_assembly(&path, config_path.as_deref()),
            name: name.into(),
            path,
            config_path,
            traits: Traits::new(),
            hooks: Vec::new(),
        }
    }
}

/// The unit of parallel execution.
#[derive(Clone, Debug)]
pub struct TestCollection {
    pub unique_id: UniqueId,
    pub display_name: String,
    pub assembly: Arc<TestAssembly>,
    /// Qualified name of the explicit collection-definition type, if any.
    pub definition: Option<String>,
    pub disable_parallelization: bool,
    pub fixtures: Vec<String>,
    /// Assembly hooks first, then collection hooks.
    pub hooks: Vec<String>,
    /// Overrides the run-wide test case orderer for this collection.
    pub test_case_orderer: Option<OrdererKind>,
}

#[derive(Clone, Debug)]
pub struct TestClass {
    pub unique_id: UniqueId,
    /// Fully qualified name.
    pub name: String,
    pub namespace: Option<String>,
    pub collection: Arc<TestCollection>,
    pub traits: Traits,
}

impl TestClass {
    /// Class name without its namespace.
    pub fn simple_name(&self) -> &str {
        match &self.namespace {
            Some(ns) => self
                .name
                .strip_prefix(ns.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(&self.name),
            None => &self.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Optional parameters render nothing when no argument is supplied.
    pub optional: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            optional: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TestMethod {
    pub unique_id: UniqueId,
    pub name: String,
    pub class: Arc<TestClass>,
    pub parameters: Vec<Parameter>,
    pub traits: Traits,
    /// Method-level skip reason.
    pub skip: Option<String>,
    pub data_sources: Vec<Arc<dyn DataSource>>,
}

impl TestMethod {
    /// `Class.Method`, the name filters and diagnostics use.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class.name, self.name)
    }
}

/// What a unit stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitKind {
    /// A parameterless method.
    Fact,
    /// One pre-enumerated theory row.
    TheoryRow,
    /// A theory whose rows are fetched at execution time.
    DelayedTheory { skip_if_no_data: bool },
    /// A synthetic unit that fails with `message` when run.
    ExecutionError { message: String },
}

/// The atomic schedulable item.
#[derive(Clone, Debug)]
pub struct TestUnit {
    pub unique_id: UniqueId,
    pub display_name: String,
    pub method: Arc<TestMethod>,
    pub skip_reason: Option<String>,
    pub traits: Traits,
    /// Concrete arguments of a pre-enumerated row.
    pub arguments: Option<Vec<Value>>,
    pub serialized_arguments: Option<String>,
    pub kind: UnitKind,
}

impl TestUnit {
    #[inline]
    pub fn class(&self) -> &TestClass {
        &self.method.class
    }

    #[inline]
    pub fn collection(&self) -> &TestCollection {
        &self.method.class.collection
    }

    #[inline]
    pub fn assembly(&self) -> &TestAssembly {
        &self.method.class.collection.assembly
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    pub fn is_execution_error(&self) -> bool {
        matches!(self.kind, UnitKind::ExecutionError { .. })
    }
}

#[cfg(test)]
mod tests;
