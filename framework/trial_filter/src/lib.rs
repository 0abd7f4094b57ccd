//! Trial Filter - decides which discovered test units run.
//!
//! Evaluation is `&self` and safe to call from many threads at once; the
//! only lock is the one guarding the compiled pattern cache.

mod filters;
mod pattern;
mod query;

pub use filters::{FilterError, TestFilters};
pub use pattern::wildcard_to_regex;
pub use query::{FilterSubject, QueryErrorKind, QueryFilter, QueryParseError, TextMatcher};
