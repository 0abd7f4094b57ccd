//! Theory data rows and the sources that produce them.

use std::fmt;

use crate::{Traits, Value};

/// One concrete argument set for a theory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataRow {
    pub arguments: Vec<Value>,
    /// Per-row skip reason; overrides the method's.
    pub skip: Option<String>,
    /// Per-row display name; replaces the synthesized one.
    pub display_name: Option<String>,
    /// Added on top of assembly, class and method traits.
    pub traits: Traits,
}

impl DataRow {
    pub fn new(arguments: Vec<Value>) -> Self {
        DataRow {
            arguments,
            ..DataRow::default()
        }
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
    pub fn with_trait(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.traits.add(name, value);
        self
    }
}

/// Failure to retrieve rows from a data source.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    /// The source exists but has not been initialized yet.
    #[error("data source returned null")]
    Null,
    #[error("{0}")]
    Failed(String),
}

/// A producer of theory data rows.
///
/// Sources are shared between discovery and execution; delayed theories call
/// [`DataSource::rows`] again at run time.
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Whether rows from this source may be expanded at discovery time.
    fn supports_discovery_enumeration(&self) -> bool {
        true
    }

    fn rows(&self) -> Result<Vec<DataRow>, DataError>;
}

/// Rows declared inline next to the method.
#[derive(Clone, Debug)]
pub struct InlineData {
    name: String,
    rows: Vec<DataRow>,
    enumerable: bool,
}

impl InlineData {
    pub fn new(rows: Vec<DataRow>) -> Self {
        InlineData {
            name: "InlineData".to_string(),
            rows,
            enumerable: true,
        }
    }

    /// Single-row shorthand.
    pub fn row(arguments: Vec<Value>) -> Self {
        InlineData::new(vec![DataRow::new(arguments)])
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Opt this source out of discovery-time enumeration.
    #[must_use]
    pub fn disable_discovery_enumeration(mut self) -> Self {
        self.enumerable = false;
        self
    }
}

impl DataSource for InlineData {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_discovery_enumeration(&self) -> bool {
        self.enumerable
    }

    fn rows(&self) -> Result<Vec<DataRow>, DataError> {
        Ok(self.rows.clone())
    }
}

type RowProducer = Box<dyn Fn() -> Result<Vec<DataRow>, DataError> + Send + Sync>;

/// Rows computed by a member at retrieval time.
pub struct MemberData {
    name: String,
    producer: RowProducer,
    enumerable: bool,
}

impl MemberData {
    pub fn new(
        name: impl Into<String>,
        producer: impl Fn() -> Result<Vec<DataRow>, DataError> + Send + Sync + 'static,
    ) -> Self {
        MemberData {
            name: name.into(),
            producer: Box::new(producer),
            enumerable: true,
        }
    }

    #[must_use]
    pub fn disable_discovery_enumeration(mut self) -> Self {
        self.enumerable = false;
        self
    }
}

impl fmt::Debug for MemberData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberData")
            .field("name", &self.name)
            .field("enumerable", &self.enumerable)
            .finish_non_exhaustive()
    }
}

impl DataSource for MemberData {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_discovery_enumeration(&self) -> bool {
        self.enumerable
    }

    fn rows(&self) -> Result<Vec<DataRow>, DataError> {
        (self.producer)()
    }
}
