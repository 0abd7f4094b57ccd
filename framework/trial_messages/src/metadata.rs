//! Correlates "starting" messages with the messages that follow them.
//!
//! Later messages carry only unique IDs. Reporters that need a display name
//! when a test fails, or an assembly name for the final summary, look it up
//! here. Entries are created by "starting" messages and removed by the
//! matching "finished" message, except assembly metadata, which survives
//! `AssemblyFinished` so end-of-run summaries can still resolve it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use trial_ir::UniqueId;

use crate::{Message, MessageKind};

/// What the cache remembers about an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Metadata {
    Assembly { name: String, path: String },
    Collection { display_name: String },
    Class { name: String },
    Method { name: String },
    TestCase { display_name: String },
    Test { display_name: String },
}

impl Metadata {
    /// The name a reporter shows for this entity.
    pub fn display_name(&self) -> &str {
        match self {
            Metadata::Assembly { name, .. }
            | Metadata::Class { name }
            | Metadata::Method { name } => name,
            Metadata::Collection { display_name }
            | Metadata::TestCase { display_name }
            | Metadata::Test { display_name } => display_name,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata for '{0}' was already set")]
    DuplicateKey(UniqueId),
    #[error("{0:?} message has no correlation id")]
    MissingId(MessageKind),
}

/// Concurrent `unique ID -> metadata` store.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: DashMap<UniqueId, Metadata>,
}

impl MetadataCache {
    pub fn new() -> Self {
        MetadataCache::default()
    }

    /// Insert metadata for a new entity. A second insert under the same ID
    /// means the ID scheme is broken.
    pub fn set(&self, id: UniqueId, metadata: Metadata) -> Result<(), MetadataError> {
        match self.entries.entry(id) {
            Entry::Occupied(occupied) => Err(MetadataError::DuplicateKey(occupied.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(metadata);
                Ok(())
            }
        }
    }

    /// Read metadata, removing it when `remove` is set.
    pub fn try_get(&self, id: &UniqueId, remove: bool) -> Option<Metadata> {
        if remove {
            self.try_remove(id)
        } else {
            self.entries.get(id).map(|entry| entry.value().clone())
        }
    }

    pub fn try_remove(&self, id: &UniqueId) -> Option<Metadata> {
        self.entries.remove(id).map(|(_, metadata)| metadata)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything, including retained assembly metadata.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Apply the cache lifecycle for `message` and return the metadata of the
    /// entity it refers to.
    ///
    /// Starting messages insert. Finished messages remove (assembly metadata
    /// is only read). Every other message with an ID reads.
    pub fn track(&self, message: &Message) -> Result<Option<Metadata>, MetadataError> {
        let ids = message.ids();
        let starting = match message {
            Message::AssemblyStarting {
                assembly_name,
                assembly_path,
                ..
            } => Some((
                ids.assembly.as_ref(),
                Metadata::Assembly {
                    name: assembly_name.clone(),
                    path: assembly_path.clone(),
                },
            )),
            Message::CollectionStarting { display_name, .. } => Some((
                ids.collection.as_ref(),
                Metadata::Collection {
                    display_name: display_name.clone(),
                },
            )),
            Message::ClassStarting { class_name, .. } => Some((
                ids.class.as_ref(),
                Metadata::Class {
                    name: class_name.clone(),
                },
            )),
            Message::MethodStarting { method_name, .. } => Some((
                ids.method.as_ref(),
                Metadata::Method {
                    name: method_name.clone(),
                },
            )),
            Message::TestCaseStarting { display_name, .. } => Some((
                ids.test_case.as_ref(),
                Metadata::TestCase {
                    display_name: display_name.clone(),
                },
            )),
            Message::TestStarting { display_name, .. } => Some((
                ids.test.as_ref(),
                Metadata::Test {
                    display_name: display_name.clone(),
                },
            )),
            _ => None,
        };

        if let Some((id, metadata)) = starting {
            let id = id.ok_or(MetadataError::MissingId(message.kind()))?;
            self.set(id.clone(), metadata.clone())?;
            return Ok(Some(metadata));
        }

        let finished = match message {
            Message::AssemblyFinished { .. } => {
                return Ok(ids.assembly.as_ref().and_then(|id| self.try_get(id, false)));
            }
            Message::CollectionFinished { .. } => ids.collection.as_ref(),
            Message::ClassFinished { .. } => ids.class.as_ref(),
            Message::MethodFinished { .. } => ids.method.as_ref(),
            Message::TestCaseFinished { .. } => ids.test_case.as_ref(),
            Message::TestFinished { .. } => ids.test.as_ref(),
            _ => {
                return Ok(ids.innermost().and_then(|id| self.try_get(id, false)));
            }
        };
        Ok(finished.and_then(|id| self.try_remove(id)))
    }
}
