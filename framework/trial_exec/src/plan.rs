//! Grouping of flat test units into the execution hierarchy.
//!
//! Every level keeps first-appearance order; the scheduler applies the
//! configured orderers afterwards.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use trial_ir::{TestAssembly, TestClass, TestCollection, TestMethod, TestUnit, UniqueId};
use trial_order::{Identified, Orderer, OrderingConfig};

#[derive(Debug)]
pub(crate) struct MethodGroup {
    pub method: Arc<TestMethod>,
    pub units: Vec<TestUnit>,
}

#[derive(Debug)]
pub(crate) struct ClassGroup {
    pub class: Arc<TestClass>,
    pub methods: Vec<MethodGroup>,
}

#[derive(Debug)]
pub(crate) struct CollectionGroup {
    pub collection: Arc<TestCollection>,
    pub classes: Vec<ClassGroup>,
}

#[derive(Debug)]
pub(crate) struct AssemblyGroup {
    pub assembly: Arc<TestAssembly>,
    pub collections: Vec<CollectionGroup>,
}

impl Identified for MethodGroup {
    fn unique_id(&self) -> &UniqueId {
        &self.method.unique_id
    }
}

impl Identified for ClassGroup {
    fn unique_id(&self) -> &UniqueId {
        &self.class.unique_id
    }
}

impl Identified for CollectionGroup {
    fn unique_id(&self) -> &UniqueId {
        &self.collection.unique_id
    }
}

impl CollectionGroup {
    pub fn unit_count(&self) -> usize {
        self.classes
            .iter()
            .flat_map(|c| &c.methods)
            .map(|m| m.units.len())
            .sum()
    }
}

/// Position of `id` in `items`, pushing `make()` on first sight.
fn slot<T>(
    items: &mut Vec<T>,
    index: &mut FxHashMap<UniqueId, usize>,
    id: &UniqueId,
    make: impl FnOnce() -> T,
) -> usize {
    if let Some(&position) = index.get(id) {
        return position;
    }
    items.push(make());
    let position = items.len() - 1;
    index.insert(id.clone(), position);
    position
}

/// Group `units` by assembly, collection, class and method.
///
/// IDs are hierarchical, so a child ID determines its parent and one index
/// per level is enough.
pub(crate) fn group(units: Vec<TestUnit>) -> Vec<AssemblyGroup> {
    let mut assemblies: Vec<AssemblyGroup> = Vec::new();
    let mut assembly_index = FxHashMap::default();
    let mut collection_index = FxHashMap::default();
    let mut class_index = FxHashMap::default();
    let mut method_index = FxHashMap::default();

    for unit in units {
        let method = Arc::clone(&unit.method);
        let class = Arc::clone(&method.class);
        let collection = Arc::clone(&class.collection);
        let assembly = Arc::clone(&collection.assembly);

        let a = slot(&mut assemblies, &mut assembly_index, &assembly.unique_id, || {
            AssemblyGroup {
                assembly: Arc::clone(&assembly),
                collections: Vec::new(),
            }
        });
        let collections = &mut assemblies[a].collections;
        let c = slot(collections, &mut collection_index, &collection.unique_id, || {
            CollectionGroup {
                collection: Arc::clone(&collection),
                classes: Vec::new(),
            }
        });
        let classes = &mut collections[c].classes;
        let k = slot(classes, &mut class_index, &class.unique_id, || ClassGroup {
            class: Arc::clone(&class),
            methods: Vec::new(),
        });
        let methods = &mut classes[k].methods;
        let m = slot(methods, &mut method_index, &method.unique_id, || MethodGroup {
            method: Arc::clone(&method),
            units: Vec::new(),
        });
        methods[m].units.push(unit);
    }

    assemblies
}

/// Apply the configured orderer at every level below the assembly.
pub(crate) fn order(assembly: &mut AssemblyGroup, config: &OrderingConfig) {
    let collections = std::mem::take(&mut assembly.collections);
    assembly.collections = config.test_collections.order(collections);

    for collection in &mut assembly.collections {
        let case_order = config.test_cases_for(&collection.collection);
        let classes = std::mem::take(&mut collection.classes);
        collection.classes = config.test_classes.order(classes);

        for class in &mut collection.classes {
            let methods = std::mem::take(&mut class.methods);
            class.methods = config.test_methods.order(methods);

            for method in &mut class.methods {
                let units = std::mem::take(&mut method.units);
                method.units = case_order.order(units);
            }
        }
    }
}

#[cfg(test)]
mod tests;
