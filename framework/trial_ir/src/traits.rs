//! Trait metadata: a multi-valued, case-insensitive key to value mapping.
//!
//! Traits accumulate from assembly, class, method and data row. Values under
//! the same key are appended, never deduplicated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct TraitEntry {
    /// Key spelling as first added.
    name: String,
    values: Vec<String>,
}

/// Multi-valued trait mapping. Keys compare case-insensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traits {
    /// Keyed by the lowercased trait name.
    entries: BTreeMap<String, TraitEntry>,
}

impl Traits {
    pub fn new() -> Self {
        Traits::default()
    }

    /// Append `value` under `name`.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .entry(name.to_lowercase())
            .or_insert_with(|| TraitEntry {
                name,
                values: Vec::new(),
            })
            .values
            .push(value.into());
    }

    /// Builder form of [`Traits::add`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(name, value);
        self
    }

    /// Accumulate every pair of `other` into `self`.
    pub fn merge(&mut self, other: &Traits) {
        for (name, value) in other.pairs() {
            self.add(name, value);
        }
    }

    /// Union of several trait sets, in the given order.
    pub fn union<'a>(sources: impl IntoIterator<Item = &'a Traits>) -> Traits {
        let mut merged = Traits::new();
        for source in sources {
            merged.merge(source);
        }
        merged
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .get(&name.to_lowercase())
            .map(|entry| entry.values.as_slice())
    }

    /// Whether `name` carries `value`. Both comparisons ignore case.
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.get(name)
            .is_some_and(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value)))
    }

    /// Iterate keys with their values, sorted by lowercased key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Iterate every individual key/value pair.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name, v.as_str())))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Traits {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut traits = Traits::new();
        for (name, value) in iter {
            traits.add(name, value);
        }
        traits
    }
}
