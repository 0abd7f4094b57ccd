//! Trial Discovery - turns a described module into test units.
//!
//! - [`MemberEnumerator`]: what discovery knows about a module
//! - [`CollectionAssignor`]: class -> collection
//! - [`Discoverer`]: the discovery pass
//! - [`TestCaseDiscoverer`]: per-marker strategies (fact, theory, custom)
//! - [`theory::decide`]: pre-enumeration vs. delayed enumeration

mod collection;
mod context;
mod diagnostics;
mod discoverer;
mod display;
mod options;
mod source;
mod strategy;
pub mod theory;

pub use collection::CollectionAssignor;
pub use context::MethodContext;
pub use diagnostics::{panic_message, Diagnostics};
pub use discoverer::Discoverer;
pub use display::format_arguments;
pub use options::{DiscoveryOptions, MethodDisplay};
pub use source::{
    AssemblyInfo, CollectionBehavior, CollectionDefinition, CollectionMarker, CollectionPolicy,
    EnumerationError, MarkerKind, MemberEnumerator, MethodInfo, StaticModule, TestMarker,
    TypeInfo,
};
pub use strategy::{FactDiscoverer, TestCaseDiscoverer, TheoryDiscoverer};
