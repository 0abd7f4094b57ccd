//! The member enumerator: what discovery knows about a module.
//!
//! Discovery never reflects over anything itself. A [`MemberEnumerator`]
//! describes the module's types, their methods and the markers on them as
//! plain data, and discovery works from that description alone.

use std::fmt;
use std::sync::Arc;

use trial_ir::{DataSource, OrdererKind, Parameter, Traits};

use crate::strategy::TestCaseDiscoverer;

/// Default collection policy for classes without an explicit marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollectionPolicy {
    /// Every class is its own collection.
    #[default]
    PerClass,
    /// The whole module is one collection.
    PerAssembly,
}

/// Module-level collection configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionBehavior {
    pub policy: CollectionPolicy,
    /// Forces every collection to run on its own.
    pub disable_parallelization: bool,
}

/// Module-level facts.
#[derive(Clone, Debug, Default)]
pub struct AssemblyInfo {
    /// Simple name.
    pub name: String,
    pub path: String,
    pub config_path: Option<String>,
    pub behavior: CollectionBehavior,
    pub traits: Traits,
    /// Hooks applied to every collection.
    pub hooks: Vec<String>,
}

impl AssemblyInfo {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        AssemblyInfo {
            name: name.into(),
            path: path.into(),
            ..AssemblyInfo::default()
        }
    }
}

/// Explicit collection membership declared on a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionMarker {
    /// By collection name.
    Named(String),
    /// By qualified name of a collection-definition type.
    Type(String),
}

/// Metadata declared on a collection-definition type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionDefinition {
    /// Name that by-name markers refer to.
    pub name: Option<String>,
    pub fixtures: Vec<String>,
    pub hooks: Vec<String>,
    pub disable_parallelization: bool,
    pub test_case_orderer: Option<OrdererKind>,
}

#[derive(Clone, Debug)]
pub struct TypeInfo {
    /// Fully qualified name.
    pub name: String,
    pub namespace: Option<String>,
    pub is_exported: bool,
    pub is_abstract: bool,
    /// Instance test methods need one.
    pub has_usable_constructor: bool,
    pub collection: Option<CollectionMarker>,
    pub collection_definition: Option<CollectionDefinition>,
    pub traits: Traits,
}

impl TypeInfo {
    /// An exported, concrete, constructible type. The namespace is everything
    /// before the last `.` of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let namespace = name.rsplit_once('.').map(|(ns, _)| ns.to_string());
        TypeInfo {
            name,
            namespace,
            is_exported: true,
            is_abstract: false,
            has_usable_constructor: true,
            collection: None,
            collection_definition: None,
            traits: Traits::new(),
        }
    }

    #[must_use]
    pub fn in_collection(mut self, marker: CollectionMarker) -> Self {
        self.collection = Some(marker);
        self
    }

    #[must_use]
    pub fn defining_collection(mut self, definition: CollectionDefinition) -> Self {
        self.collection_definition = Some(definition);
        self
    }

    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.add(name, value);
        self
    }
}

/// Which discovery strategy a marker selects.
#[derive(Clone)]
pub enum MarkerKind {
    Fact,
    Theory,
    /// A user-supplied strategy.
    Custom(Arc<dyn TestCaseDiscoverer>),
}

impl fmt::Debug for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::Fact => f.write_str("Fact"),
            MarkerKind::Theory => f.write_str("Theory"),
            MarkerKind::Custom(discoverer) => f.debug_tuple("Custom").field(discoverer).finish(),
        }
    }
}

/// A test marker attached to a method.
#[derive(Clone, Debug)]
pub struct TestMarker {
    pub kind: MarkerKind,
    /// Replaces the synthesized `Class.Method` base name.
    pub display_name: Option<String>,
    /// Unconditional skip reason.
    pub skip: Option<String>,
    /// Theory: always defer row expansion to execution time.
    pub disable_discovery_enumeration: bool,
    /// Theory: an empty data set yields a skipped unit instead of an error.
    pub skip_test_without_data: bool,
}

impl TestMarker {
    fn new(kind: MarkerKind) -> Self {
        TestMarker {
            kind,
            display_name: None,
            skip: None,
            disable_discovery_enumeration: false,
            skip_test_without_data: false,
        }
    }

    pub fn fact() -> Self {
        TestMarker::new(MarkerKind::Fact)
    }

    pub fn theory() -> Self {
        TestMarker::new(MarkerKind::Theory)
    }

    pub fn custom(discoverer: Arc<dyn TestCaseDiscoverer>) -> Self {
        TestMarker::new(MarkerKind::Custom(discoverer))
    }

    #[must_use]
    pub fn with_skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn without_discovery_enumeration(mut self) -> Self {
        self.disable_discovery_enumeration = true;
        self
    }

    #[must_use]
    pub fn skip_without_data(mut self) -> Self {
        self.skip_test_without_data = true;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct MethodInfo {
    pub name: String,
    pub is_static: bool,
    pub is_generic: bool,
    pub parameters: Vec<Parameter>,
    pub markers: Vec<TestMarker>,
    pub data_sources: Vec<Arc<dyn DataSource>>,
    pub traits: Traits,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>) -> Self {
        MethodInfo {
            name: name.into(),
            ..MethodInfo::default()
        }
    }

    #[must_use]
    pub fn marked(mut self, marker: TestMarker) -> Self {
        self.markers.push(marker);
        self
    }

    #[must_use]
    pub fn with_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters
            .extend(names.into_iter().map(|n| Parameter::new(n)));
        self
    }

    #[must_use]
    pub fn with_data(mut self, source: impl DataSource + 'static) -> Self {
        self.data_sources.push(Arc::new(source));
        self
    }

    #[must_use]
    pub fn with_trait(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.add(name, value);
        self
    }

    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn generic(mut self) -> Self {
        self.is_generic = true;
        self
    }
}

/// Failure reported by a member enumerator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct EnumerationError(pub String);

/// Describes a module to discovery.
///
/// Implementations may be called from several discovery threads at once.
pub trait MemberEnumerator: Sync {
    fn assembly(&self) -> &AssemblyInfo;

    /// Every candidate type in the module.
    fn types(&self) -> Result<Vec<TypeInfo>, EnumerationError>;

    /// Candidate methods of one type, with their markers and data sources.
    fn methods(&self, ty: &TypeInfo) -> Result<Vec<MethodInfo>, EnumerationError>;

    /// Look up a type by qualified name.
    fn resolve_type(&self, name: &str) -> Option<TypeInfo>;
}

/// A [`MemberEnumerator`] over a fixed, in-memory description.
#[derive(Clone, Debug, Default)]
pub struct StaticModule {
    assembly: AssemblyInfo,
    types: Vec<(TypeInfo, Vec<MethodInfo>)>,
}

impl StaticModule {
    pub fn new(assembly: AssemblyInfo) -> Self {
        StaticModule {
            assembly,
            types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_type(mut self, ty: TypeInfo, methods: Vec<MethodInfo>) -> Self {
        self.types.push((ty, methods));
        self
    }
}

impl MemberEnumerator for StaticModule {
    fn assembly(&self) -> &AssemblyInfo {
        &self.assembly
    }

    fn types(&self) -> Result<Vec<TypeInfo>, EnumerationError> {
        Ok(self.types.iter().map(|(ty, _)| ty.clone()).collect())
    }

    fn methods(&self, ty: &TypeInfo) -> Result<Vec<MethodInfo>, EnumerationError> {
        self.types
            .iter()
            .find(|(candidate, _)| candidate.name == ty.name)
            .map(|(_, methods)| methods.clone())
            .ok_or_else(|| EnumerationError(format!("unknown type '{}'", ty.name)))
    }

    fn resolve_type(&self, name: &str) -> Option<TypeInfo> {
        self.types
            .iter()
            .find(|(ty, _)| ty.name == name)
            .map(|(ty, _)| ty.clone())
    }
}
