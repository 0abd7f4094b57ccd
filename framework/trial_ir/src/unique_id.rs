//! Deterministic identity hashing.
//!
//! Every entity the framework reports on (assembly, collection, class,
//! method, test case, test) carries a [`UniqueId`] derived from its semantic
//! content, never from object identity. Identical input produces an identical
//! ID on every process, machine and OS.
//!
//! # Encoding
//!
//! Each part is fed to SHA-256 as a presence tag, a little-endian `u64`
//! length and the UTF-8 bytes. An absent optional part contributes only the
//! absent tag, so `None` and `Some("")` hash differently and `["a", "b"]`
//! never collides with `["ab"]`.
//!
//! The rendered form is [`ID_VERSION`] followed by the 64 lowercase hex
//! digits of the digest.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Algorithm-version prefix of every rendered ID.
///
/// Kept to hex digits so the whole ID stays a lowercase hex string.
pub const ID_VERSION: &str = "01";

/// Length of every rendered ID.
pub const ID_LEN: usize = ID_VERSION.len() + 64;

const TAG_PRESENT: u8 = 0x01;
const TAG_ABSENT: u8 = 0x00;

/// Opaque correlation token for a framework entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(String);

impl UniqueId {
    /// Wrap an ID produced elsewhere (read back from transport, for example).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        UniqueId(raw.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UniqueId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Incremental builder over an ordered sequence of parts.
#[derive(Clone, Default)]
pub struct UniqueIdBuilder {
    hasher: Sha256,
}

impl UniqueIdBuilder {
    pub fn new() -> Self {
        UniqueIdBuilder::default()
    }

    /// Append a present part.
    #[must_use]
    pub fn part(mut self, part: &str) -> Self {
        self.hasher.update([TAG_PRESENT]);
        self.hasher.update((part.len() as u64).to_le_bytes());
        self.hasher.update(part.as_bytes());
        self
    }

    /// Append a part that may be absent.
    #[must_use]
    pub fn optional_part(mut self, part: Option<&str>) -> Self {
        match part {
            Some(part) => self.part(part),
            None => {
                self.hasher.update([TAG_ABSENT]);
                self
            }
        }
    }

    pub fn finish(self) -> UniqueId {
        let digest = self.hasher.finalize();
        UniqueId(format!("{ID_VERSION}{}", hex::encode(digest)))
    }
}

/// Hash an ordered sequence of present parts.
pub fn hash<'a>(parts: impl IntoIterator<Item = &'a str>) -> UniqueId {
    parts
        .into_iter()
        .fold(UniqueIdBuilder::new(), UniqueIdBuilder::part)
        .finish()
}

/// Hash an ordered sequence of parts, some of which may be absent.
pub fn hash_optional<'a>(parts: impl IntoIterator<Item = Option<&'a str>>) -> UniqueId {
    parts
        .into_iter()
        .fold(UniqueIdBuilder::new(), UniqueIdBuilder::optional_part)
        .finish()
}

pub fn for_assembly(path: &str, config_path: Option<&str>) -> UniqueId {
    UniqueIdBuilder::new()
        .part(path)
        .optional_part(config_path)
        .finish()
}

/// Collection identity: the display name disambiguated by its definition
/// type, scoped to the owning assembly.
pub fn for_collection(
    assembly_id: &UniqueId,
    display_name: &str,
    definition_type: Option<&str>,
) -> UniqueId {
    UniqueIdBuilder::new()
        .part(assembly_id.as_str())
        .part(display_name)
        .optional_part(definition_type)
        .finish()
}

pub fn for_class(collection_id: &UniqueId, class_name: &str) -> UniqueId {
    hash([collection_id.as_str(), class_name])
}

pub fn for_method(class_id: &UniqueId, method_name: &str) -> UniqueId {
    hash([class_id.as_str(), method_name])
}

/// Test case identity. Pre-enumerated theory rows pass their serialized
/// arguments; facts and delayed theories pass `None`.
pub fn for_test_case(method_id: &UniqueId, serialized_arguments: Option<&str>) -> UniqueId {
    UniqueIdBuilder::new()
        .part(method_id.as_str())
        .optional_part(serialized_arguments)
        .finish()
}

pub fn for_test(case_id: &UniqueId, index: usize) -> UniqueId {
    hash([case_id.as_str(), &index.to_string()])
}

/// Identity of a type within an assembly, used to disambiguate collection
/// display names of same-named types from different namespaces.
pub fn for_type(assembly_name: &str, type_name: &str) -> UniqueId {
    hash([assembly_name, type_name])
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
