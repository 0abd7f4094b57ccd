//! Orderer strategies and the per-granularity configuration.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use trial_ir::{OrdererKind, TestClass, TestCollection, TestMethod, TestUnit, UniqueId};

/// Fixed across processes; changing it reshuffles every run.
const ORDER_SALT: &[u8] = b"trial.order.v1\0";

/// Anything carrying a unique ID can be ordered.
pub trait Identified {
    fn unique_id(&self) -> &UniqueId;
}

impl Identified for UniqueId {
    fn unique_id(&self) -> &UniqueId {
        self
    }
}

impl Identified for TestUnit {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

impl Identified for TestMethod {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

impl Identified for TestClass {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

impl Identified for TestCollection {
    fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }
}

impl<T: Identified + ?Sized> Identified for &T {
    fn unique_id(&self) -> &UniqueId {
        (**self).unique_id()
    }
}

impl<T: Identified + ?Sized> Identified for Arc<T> {
    fn unique_id(&self) -> &UniqueId {
        (**self).unique_id()
    }
}

/// Sort key of the stable-random strategy.
pub fn order_key(id: &UniqueId) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ORDER_SALT);
    hasher.update(id.as_str().as_bytes());
    hasher.finalize().into()
}

/// A permutation strategy. Output always has the input's length and
/// elements; duplicates are kept and ordered by position.
pub trait Orderer<T> {
    fn order(&self, items: Vec<T>) -> Vec<T>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UnorderedOrderer;

impl<T> Orderer<T> for UnorderedOrderer {
    fn order(&self, items: Vec<T>) -> Vec<T> {
        items
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOrderer;

impl<T: Identified> Orderer<T> for DefaultOrderer {
    fn order(&self, mut items: Vec<T>) -> Vec<T> {
        // Digest first, unique ID as tie-breaker. The sort is stable, so
        // duplicate IDs keep their relative positions.
        items.sort_by_cached_key(|item| {
            let id = item.unique_id();
            (order_key(id), id.clone())
        });
        items
    }
}

impl<T: Identified> Orderer<T> for OrdererKind {
    fn order(&self, items: Vec<T>) -> Vec<T> {
        match self {
            OrdererKind::Default => DefaultOrderer.order(items),
            OrdererKind::Unordered => UnorderedOrderer.order(items),
        }
    }
}

/// Strategy per granularity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OrderingConfig {
    /// Order of test cases within a method (or collection override).
    pub test_cases: OrdererKind,
    /// Order of methods within a class.
    pub test_methods: OrdererKind,
    /// Order of classes within a collection.
    pub test_classes: OrdererKind,
    /// Order in which collections are dispatched.
    pub test_collections: OrdererKind,
}

impl OrderingConfig {
    /// Every granularity in input order.
    pub fn unordered() -> Self {
        OrderingConfig {
            test_cases: OrdererKind::Unordered,
            test_methods: OrdererKind::Unordered,
            test_classes: OrdererKind::Unordered,
            test_collections: OrdererKind::Unordered,
        }
    }

    /// Test case strategy for one collection, honoring its override.
    pub fn test_cases_for(&self, collection: &TestCollection) -> OrdererKind {
        collection.test_case_orderer.unwrap_or(self.test_cases)
    }
}
