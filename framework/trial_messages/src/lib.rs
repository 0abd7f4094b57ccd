//! Trial Messages - the lifecycle message pipeline.
//!
//! - [`Message`]: tagged, immutable lifecycle events with correlation IDs
//! - [`MessageBus`]: synchronous kind-to-subscribers registry
//! - [`MetadataCache`]: correlates "starting" messages with later ones

mod bus;
mod message;
mod metadata;

pub use bus::{MessageBus, MessageRecorder, MessageSink};
pub use message::{CleanupScope, Correlation, ExecutionTotals, Message, MessageKind};
pub use metadata::{Metadata, MetadataCache, MetadataError};
