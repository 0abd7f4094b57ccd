//! Trial Order - deterministic permutations of test items.
//!
//! Two strategies, usable at every granularity (test case, method, class,
//! collection):
//!
//! - **Unordered**: the identity permutation.
//! - **Default**: stable-random. Items are sorted by a salted SHA-256 digest
//!   of their unique ID, so the order never changes between runs yet has no
//!   relation to declaration order.

mod orderer;

pub use orderer::{
    order_key, DefaultOrderer, Identified, Orderer, OrderingConfig, UnorderedOrderer,
};
pub use trial_ir::OrdererKind;
