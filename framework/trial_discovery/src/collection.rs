//! Maps test classes to test collections, the unit of parallel execution.
//!
//! A class joins a collection through an explicit marker, either by name or
//! by a collection-definition type. Unmarked classes follow the module's
//! [`CollectionPolicy`]. Assignments are memoized per class, and classes that
//! resolve to the same collection identity share one `Arc<TestCollection>`.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use trial_ir::unique_id::{self, UniqueId};
use trial_ir::{TestAssembly, TestCollection};

use crate::diagnostics::Diagnostics;
use crate::source::{
    CollectionBehavior, CollectionDefinition, CollectionMarker, CollectionPolicy,
    MemberEnumerator, TypeInfo,
};

#[derive(Default)]
struct Assignments {
    by_class: FxHashMap<String, Arc<TestCollection>>,
    by_identity: FxHashMap<UniqueId, Arc<TestCollection>>,
}

/// What a class's collection is derived from, before identity is computed.
struct Source<'d> {
    display_name: String,
    definition_type: Option<String>,
    definition: Option<&'d CollectionDefinition>,
}

pub struct CollectionAssignor<'a> {
    enumerator: &'a dyn MemberEnumerator,
    assembly: Arc<TestAssembly>,
    behavior: CollectionBehavior,
    /// Collection name -> (definition type, definition). First one wins.
    definitions: FxHashMap<String, (String, CollectionDefinition)>,
    assignments: Mutex<Assignments>,
}

impl<'a> CollectionAssignor<'a> {
    /// Index the collection definitions found among `types`.
    pub fn new(
        enumerator: &'a dyn MemberEnumerator,
        assembly: Arc<TestAssembly>,
        types: &[TypeInfo],
        diagnostics: &Diagnostics<'_>,
    ) -> Self {
        let mut definitions = FxHashMap::default();
        for ty in types {
            let Some(definition) = &ty.collection_definition else {
                continue;
            };
            let Some(name) = &definition.name else {
                continue;
            };
            if definitions.contains_key(name) {
                diagnostics.report(format!(
                    "Duplicate collection definition name '{name}' found on '{}'",
                    ty.name
                ));
                continue;
            }
            definitions.insert(name.clone(), (ty.name.clone(), definition.clone()));
        }

        CollectionAssignor {
            behavior: enumerator.assembly().behavior,
            enumerator,
            assembly,
            definitions,
            assignments: Mutex::new(Assignments::default()),
        }
    }

    /// The collection `class` belongs to.
    pub fn assign(&self, class: &TypeInfo, diagnostics: &Diagnostics<'_>) -> Arc<TestCollection> {
        if let Some(existing) = self.assignments.lock().by_class.get(&class.name) {
            return Arc::clone(existing);
        }

        // Type resolution may call back into the enumerator; keep it unlocked.
        let resolved_type;
        let source = match &class.collection {
            Some(CollectionMarker::Named(name)) => self.named(name),
            Some(CollectionMarker::Type(type_name)) => {
                resolved_type = self.enumerator.resolve_type(type_name);
                match &resolved_type {
                    Some(ty) => Source {
                        display_name: format!(
                            "Test collection for {} (id: {})",
                            ty.name,
                            unique_id::for_type(&self.assembly.name, &ty.name)
                        ),
                        definition_type: Some(ty.name.clone()),
                        definition: ty.collection_definition.as_ref(),
                    },
                    None => {
                        diagnostics.report(format!(
                            "Unable to resolve collection definition type '{type_name}' for class '{}'; using it as a collection name",
                            class.name
                        ));
                        self.named(type_name)
                    }
                }
            }
            None => match self.behavior.policy {
                CollectionPolicy::PerClass => Source {
                    display_name: format!(
                        "Test collection for {} (id: {})",
                        class.name,
                        unique_id::for_type(&self.assembly.name, &class.name)
                    ),
                    definition_type: None,
                    definition: None,
                },
                CollectionPolicy::PerAssembly => Source {
                    display_name: format!("Test collection for {}", self.assembly.name),
                    definition_type: None,
                    definition: None,
                },
            },
        };

        let collection = self.build(source);
        let mut assignments = self.assignments.lock();
        let shared = Arc::clone(
            assignments
                .by_identity
                .entry(collection.unique_id.clone())
                .or_insert_with(|| Arc::new(collection)),
        );
        Arc::clone(
            assignments
                .by_class
                .entry(class.name.clone())
                .or_insert(shared),
        )
    }

    /// Number of distinct collections handed out so far.
    pub fn collection_count(&self) -> usize {
        self.assignments.lock().by_identity.len()
    }

    fn named(&self, name: &str) -> Source<'_> {
        let (definition_type, definition) = match self.definitions.get(name) {
            Some((ty, definition)) => (Some(ty.clone()), Some(definition)),
            None => (None, None),
        };
        Source {
            display_name: format!("Test collection for {name}"),
            definition_type,
            definition,
        }
    }

    fn build(&self, source: Source<'_>) -> TestCollection {
        let unique_id = unique_id::for_collection(
            &self.assembly.unique_id,
            &source.display_name,
            source.definition_type.as_deref(),
        );

        let mut hooks = self.assembly.hooks.clone();
        let (fixtures, disable_parallelization, test_case_orderer) = match source.definition {
            Some(definition) => {
                hooks.extend(definition.hooks.iter().cloned());
                (
                    definition.fixtures.clone(),
                    definition.disable_parallelization,
                    definition.test_case_orderer,
                )
            }
            None => (Vec::new(), false, None),
        };

        TestCollection {
            unique_id,
            display_name: source.display_name,
            assembly: Arc::clone(&self.assembly),
            definition: source.definition_type,
            disable_parallelization: disable_parallelization
                || self.behavior.disable_parallelization,
            fixtures,
            hooks,
            test_case_orderer,
        }
    }
}

impl std::fmt::Debug for CollectionAssignor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionAssignor")
            .field("assembly", &self.assembly.name)
            .field("definitions", &self.definitions.len())
            .finish_non_exhaustive()
    }
}
