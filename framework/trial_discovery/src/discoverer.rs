//! The discovery pass: module -> stream of test units.
//!
//! Types are walked one at a time, or fanned out across a scoped worker pool
//! when [`DiscoveryOptions::parallel`] is set. A failure while discovering a
//! type (an enumerator error or a panic) becomes a diagnostic and the pass
//! continues with the next type. A failure that belongs to one method
//! becomes an error unit for that method.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use rayon::prelude::*;
use trial_ir::unique_id;
use trial_ir::{TestAssembly, TestClass, TestMethod, TestUnit};
use trial_messages::{Correlation, Message, MessageBus};

use crate::collection::CollectionAssignor;
use crate::context::MethodContext;
use crate::diagnostics::{panic_message, Diagnostics};
use crate::options::DiscoveryOptions;
use crate::source::{EnumerationError, MemberEnumerator, MethodInfo, TypeInfo};
use crate::strategy::strategy_for;

/// State shared by every type of one discovery pass.
struct Pass<'p> {
    assignor: CollectionAssignor<'p>,
    diagnostics: Diagnostics<'p>,
}

pub struct Discoverer<'a> {
    enumerator: &'a dyn MemberEnumerator,
    options: DiscoveryOptions,
    bus: Option<&'a MessageBus>,
}

impl<'a> Discoverer<'a> {
    pub fn new(enumerator: &'a dyn MemberEnumerator, options: DiscoveryOptions) -> Self {
        Discoverer {
            enumerator,
            options,
            bus: None,
        }
    }

    /// Publish discovery messages and diagnostics on `bus`.
    #[must_use]
    pub fn with_bus(mut self, bus: &'a MessageBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// The assembly every discovered unit belongs to.
    pub fn assembly(&self) -> TestAssembly {
        let info = self.enumerator.assembly();
        let mut assembly = TestAssembly::new(&info.name, &info.path, info.config_path.clone());
        assembly.traits = info.traits.clone();
        assembly.hooks = info.hooks.clone();
        assembly
    }

    /// Discover every unit in the module, handing each to `callback`.
    ///
    /// With parallel discovery, `callback` runs concurrently and in no
    /// particular order. Returns the number of units reported.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(assembly = %self.enumerator.assembly().name)
    )]
    pub fn discover<F>(&self, callback: F) -> usize
    where
        F: Fn(TestUnit) + Sync,
    {
        let assembly = Arc::new(self.assembly());
        let assembly_id = assembly.unique_id.clone();
        let diagnostics = Diagnostics::new(self.bus, &assembly_id);
        self.publish(Message::DiscoveryStarting {
            ids: Correlation::assembly(&assembly_id),
            assembly_name: assembly.name.clone(),
        });

        let count = match self.enumerator.types() {
            Ok(types) => {
                let candidates: Vec<&TypeInfo> = types
                    .iter()
                    .filter(|ty| ty.is_exported && !ty.is_abstract)
                    .collect();
                let pass = Pass {
                    assignor: CollectionAssignor::new(
                        self.enumerator,
                        Arc::clone(&assembly),
                        &types,
                        &diagnostics,
                    ),
                    diagnostics,
                };
                if self.options.parallel {
                    self.discover_parallel(&pass, &candidates, &callback)
                } else {
                    candidates
                        .iter()
                        .map(|ty| self.guarded_type(&pass, ty, &callback))
                        .sum()
                }
            }
            Err(error) => {
                diagnostics.report(format!(
                    "Exception during discovery of assembly '{}': {error}",
                    assembly.name
                ));
                0
            }
        };

        tracing::debug!(count, "discovery complete");
        self.publish(Message::DiscoveryComplete {
            ids: Correlation::assembly(&assembly_id),
            test_cases: count,
        });
        count
    }

    /// Discover every unit into a vector. Order follows discovery order,
    /// which is only meaningful for sequential discovery.
    pub fn discover_all(&self) -> Vec<TestUnit> {
        let units = Mutex::new(Vec::new());
        self.discover(|unit| units.lock().push(unit));
        units.into_inner()
    }

    fn discover_parallel<F>(
        &self,
        pass: &Pass<'_>,
        candidates: &[&TypeInfo],
        callback: &F,
    ) -> usize
    where
        F: Fn(TestUnit) + Sync,
    {
        rayon::ThreadPoolBuilder::new()
            .build_scoped(rayon::ThreadBuilder::run, |pool| {
                pool.install(|| {
                    candidates
                        .par_iter()
                        .map(|ty| self.guarded_type(pass, ty, callback))
                        .sum::<usize>()
                })
            })
            .unwrap_or_else(|e| {
                tracing::warn!("failed to create thread pool ({e}), discovering sequentially");
                candidates
                    .iter()
                    .map(|ty| self.guarded_type(pass, ty, callback))
                    .sum()
            })
    }

    /// One type, with enumerator errors and panics turned into diagnostics.
    fn guarded_type<F>(&self, pass: &Pass<'_>, ty: &TypeInfo, callback: &F) -> usize
    where
        F: Fn(TestUnit) + Sync,
    {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.discover_type(pass, ty, callback)));
        let error = match outcome {
            Ok(Ok(count)) => return count,
            Ok(Err(error)) => error.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        pass.diagnostics.report(format!(
            "Exception during discovery of type '{}': {error}",
            ty.name
        ));
        0
    }

    #[tracing::instrument(level = "debug", skip_all, fields(class = %ty.name))]
    fn discover_type<F>(
        &self,
        pass: &Pass<'_>,
        ty: &TypeInfo,
        callback: &F,
    ) -> Result<usize, EnumerationError>
    where
        F: Fn(TestUnit) + Sync,
    {
        let methods = self.enumerator.methods(ty)?;
        if methods.iter().all(|m| m.markers.is_empty()) {
            return Ok(0);
        }

        let collection = pass.assignor.assign(ty, &pass.diagnostics);
        let class = Arc::new(TestClass {
            unique_id: unique_id::for_class(&collection.unique_id, &ty.name),
            name: ty.name.clone(),
            namespace: ty.namespace.clone(),
            collection,
            traits: ty.traits.clone(),
        });

        let mut count = 0;
        for method in methods {
            for unit in self.discover_method(pass, ty, &class, method) {
                callback(unit);
                count += 1;
            }
        }
        Ok(count)
    }

    fn discover_method(
        &self,
        pass: &Pass<'_>,
        ty: &TypeInfo,
        class: &Arc<TestClass>,
        info: MethodInfo,
    ) -> Vec<TestUnit> {
        let Some(marker) = info.markers.first() else {
            return Vec::new();
        };
        let method = Arc::new(TestMethod {
            unique_id: unique_id::for_method(&class.unique_id, &info.name),
            name: info.name.clone(),
            class: Arc::clone(class),
            parameters: info.parameters.clone(),
            traits: info.traits.clone(),
            skip: marker.skip.clone(),
            data_sources: info.data_sources.clone(),
        });
        let ctx = MethodContext::new(method, marker, &self.options, &pass.diagnostics);

        if info.markers.len() > 1 {
            return vec![ctx.error_unit(format!(
                "Test method '{}' has multiple test-marker attributes",
                ctx.qualified_name()
            ))];
        }
        if info.is_generic {
            return vec![ctx.error_unit(format!(
                "Test method '{}' cannot be a generic method",
                ctx.qualified_name()
            ))];
        }
        if !info.is_static && !ty.has_usable_constructor {
            return vec![ctx.error_unit(format!(
                "Test class '{}' has no usable constructor for instance test method '{}'",
                ty.name, info.name
            ))];
        }

        let strategy = strategy_for(&marker.kind);
        catch_unwind(AssertUnwindSafe(|| strategy.discover(&ctx))).unwrap_or_else(|payload| {
            vec![ctx.error_unit(format!(
                "Exception during discovery of test method '{}': {}",
                ctx.qualified_name(),
                panic_message(payload.as_ref())
            ))]
        })
    }

    fn publish(&self, message: Message) {
        if let Some(bus) = self.bus {
            bus.publish(&message);
        }
    }
}

impl std::fmt::Debug for Discoverer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discoverer")
            .field("assembly", &self.enumerator.assembly().name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
