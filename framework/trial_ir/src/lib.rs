//! Trial IR - core data model of the trial test framework.
//!
//! - [`unique_id`]: deterministic, content-derived identities
//! - [`Traits`]: multi-valued trait metadata
//! - [`Value`]: theory arguments and their serialization
//! - [`DataRow`] / [`DataSource`]: theory inputs
//! - the test hierarchy from [`TestAssembly`] down to [`TestUnit`]
//!
//! Every type here is immutable after discovery builds it, so the whole
//! hierarchy is shared freely across worker threads.

mod data;
mod model;
mod traits;
pub mod unique_id;
mod value;

pub use data::{DataError, DataRow, DataSource, InlineData, MemberData};
pub use model::{
    OrdererKind, Parameter, TestAssembly, TestClass, TestCollection, TestMethod, TestUnit,
    UnitKind,
};
pub use traits::Traits;
pub use unique_id::UniqueId;
pub use value::{serialize_arguments, ArgumentSerializationError, Value};
