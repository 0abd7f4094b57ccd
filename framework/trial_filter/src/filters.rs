//! Include/exclude filters over discovered test units.
//!
//! [`TestFilters`] holds either simple filters (class, method, namespace,
//! trait entries in an include half and an exclude half) or query filters,
//! never both.
//!
//! # Pattern cache
//!
//! Class and method entries compile lazily into a [`NameMatcher`] pair. Each
//! half bumps a mutation stamp on every change; the cache remembers the stamp
//! it was built from and rebuilds under the write lock only when the two
//! differ. Evaluation otherwise takes a shared read lock.

use parking_lot::{RwLock, RwLockWriteGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use trial_ir::TestUnit;

use crate::pattern::NameMatcher;
use crate::query::{FilterSubject, QueryFilter, QueryParseError};

/// Failure to add a filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("cannot add simple filter; query filters already exist")]
    SimpleAfterQuery,
    #[error("cannot add query filter; simple filters already exist")]
    QueryAfterSimple,
    #[error("trait filter '{0}' is not valid: expected 'name=value'")]
    InvalidTrait(String),
    #[error(transparent)]
    Query(#[from] QueryParseError),
}

#[derive(Debug, Default)]
struct CompiledNames {
    /// Mutation stamp this build reflects; `None` before the first build.
    built_from: Option<u64>,
    classes: NameMatcher,
    methods: NameMatcher,
}

/// One half (include or exclude) of the simple filters.
#[derive(Debug, Default)]
struct FilterHalf {
    classes: Vec<String>,
    methods: Vec<String>,
    /// Lowercased namespaces.
    namespaces: Vec<String>,
    /// Lowercased trait name to lowercased values.
    traits: FxHashMap<String, FxHashSet<String>>,
    modified: u64,
    compiled: RwLock<CompiledNames>,
}

impl FilterHalf {
    fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.methods.is_empty()
            && self.namespaces.is_empty()
            && self.traits.is_empty()
    }

    /// Fully qualified class name; `*` and `?` wildcards allowed.
    fn add_class(&mut self, name: impl Into<String>) {
        self.classes.push(name.into());
        self.touch();
    }

    /// `Class.Method`; `*` and `?` wildcards allowed.
    fn add_method(&mut self, name: impl Into<String>) {
        self.methods.push(name.into());
        self.touch();
    }

    /// Matches the namespace itself and every nested namespace.
    fn add_namespace(&mut self, namespace: &str) {
        self.namespaces.push(namespace.to_lowercase());
        self.touch();
    }

    fn add_trait(&mut self, name: &str, value: &str) {
        self.traits
            .entry(name.to_lowercase())
            .or_default()
            .insert(value.to_lowercase());
        self.touch();
    }

    #[inline]
    fn touch(&mut self) {
        self.modified = self.modified.wrapping_add(1);
    }

    /// Evaluate `f` against an up-to-date compiled cache.
    fn with_compiled<R>(&self, f: impl FnOnce(&CompiledNames) -> R) -> R {
        {
            let cache = self.compiled.read();
            if cache.built_from == Some(self.modified) {
                return f(&cache);
            }
        }

        let mut cache = self.compiled.write();
        // Another evaluator may have rebuilt while we waited.
        if cache.built_from != Some(self.modified) {
            tracing::debug!(stamp = self.modified, "recompiling filter patterns");
            *cache = CompiledNames {
                built_from: Some(self.modified),
                classes: NameMatcher::compile(&self.classes),
                methods: NameMatcher::compile(&self.methods),
            };
        }
        f(&RwLockWriteGuard::downgrade(cache))
    }

    fn matches_class_or_method(&self, subject: &FilterSubject<'_>) -> bool {
        self.with_compiled(|names| {
            names.classes.matches(subject.class_name)
                || (!names.methods.is_empty()
                    && names
                        .methods
                        .matches(&format!("{}.{}", subject.class_name, subject.method_name)))
        })
    }

    fn matches_namespace(&self, subject: &FilterSubject<'_>) -> bool {
        let Some(namespace) = subject.namespace else {
            return false;
        };
        let namespace = namespace.to_lowercase();
        self.namespaces.iter().any(|ns| {
            namespace == *ns
                || namespace
                    .strip_prefix(ns.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    fn matches_trait(&self, subject: &FilterSubject<'_>) -> bool {
        subject.traits.pairs().any(|(name, value)| {
            self.traits
                .get(&name.to_lowercase())
                .is_some_and(|values| values.contains(&value.to_lowercase()))
        })
    }

    fn has_class_or_method(&self) -> bool {
        !self.classes.is_empty() || !self.methods.is_empty()
    }
}

/// The filter set applied between discovery and ordering.
#[derive(Debug, Default)]
pub struct TestFilters {
    include: FilterHalf,
    exclude: FilterHalf,
    queries: Vec<QueryFilter>,
}

impl TestFilters {
    pub fn new() -> Self {
        TestFilters::default()
    }

    /// No filter of any kind is active.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty() && self.has_no_simple_filters()
    }

    fn has_no_simple_filters(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    fn simple(&mut self, include: bool) -> Result<&mut FilterHalf, FilterError> {
        if !self.queries.is_empty() {
            return Err(FilterError::SimpleAfterQuery);
        }
        Ok(if include {
            &mut self.include
        } else {
            &mut self.exclude
        })
    }

    pub fn include_class(&mut self, name: &str) -> Result<(), FilterError> {
        self.simple(true)?.add_class(name);
        Ok(())
    }

    pub fn exclude_class(&mut self, name: &str) -> Result<(), FilterError> {
        self.simple(false)?.add_class(name);
        Ok(())
    }

    pub fn include_method(&mut self, name: &str) -> Result<(), FilterError> {
        self.simple(true)?.add_method(name);
        Ok(())
    }

    pub fn exclude_method(&mut self, name: &str) -> Result<(), FilterError> {
        self.simple(false)?.add_method(name);
        Ok(())
    }

    pub fn include_namespace(&mut self, namespace: &str) -> Result<(), FilterError> {
        self.simple(true)?.add_namespace(namespace);
        Ok(())
    }

    pub fn exclude_namespace(&mut self, namespace: &str) -> Result<(), FilterError> {
        self.simple(false)?.add_namespace(namespace);
        Ok(())
    }

    pub fn include_trait(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
        self.simple(true)?.add_trait(name, value);
        Ok(())
    }

    pub fn exclude_trait(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
        self.simple(false)?.add_trait(name, value);
        Ok(())
    }

    /// Textual `name=value` form of [`TestFilters::include_trait`].
    pub fn include_trait_text(&mut self, text: &str) -> Result<(), FilterError> {
        let (name, value) = split_trait(text)?;
        self.include_trait(name, value)
    }

    /// Textual `name=value` form of [`TestFilters::exclude_trait`].
    pub fn exclude_trait_text(&mut self, text: &str) -> Result<(), FilterError> {
        let (name, value) = split_trait(text)?;
        self.exclude_trait(name, value)
    }

    /// Add a query; multiple queries combine with OR.
    pub fn add_query(&mut self, query: &str) -> Result<(), FilterError> {
        if !self.has_no_simple_filters() {
            return Err(FilterError::QueryAfterSimple);
        }
        self.queries.push(QueryFilter::parse(query)?);
        Ok(())
    }

    pub fn passes(&self, unit: &TestUnit) -> bool {
        self.passes_subject(&FilterSubject::from(unit))
    }

    /// True iff the subject survives every active predicate group.
    pub fn passes_subject(&self, subject: &FilterSubject<'_>) -> bool {
        if !self.queries.is_empty() {
            return self.queries.iter().any(|q| q.matches(subject));
        }

        let include = &self.include;
        if include.has_class_or_method() && !include.matches_class_or_method(subject) {
            return false;
        }
        if !include.namespaces.is_empty() && !include.matches_namespace(subject) {
            return false;
        }
        // A unit without traits never satisfies an active include-trait filter.
        if !include.traits.is_empty() && !include.matches_trait(subject) {
            return false;
        }

        let exclude = &self.exclude;
        if exclude.has_class_or_method() && exclude.matches_class_or_method(subject) {
            return false;
        }
        if !exclude.namespaces.is_empty() && exclude.matches_namespace(subject) {
            return false;
        }
        if !exclude.traits.is_empty() && exclude.matches_trait(subject) {
            return false;
        }

        true
    }
}

fn split_trait(text: &str) -> Result<(&str, &str), FilterError> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
            Ok((name.trim(), value.trim()))
        }
        _ => Err(FilterError::InvalidTrait(text.to_string())),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
