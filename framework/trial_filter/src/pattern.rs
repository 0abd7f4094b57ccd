//! Name matching for class and method filters.
//!
//! Entries without wildcards go into a lowercased exact set. Entries with
//! `*` or `?` compile to anchored, case-insensitive regular expressions.

use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;

/// Whether `entry` needs regex compilation.
#[inline]
pub fn is_wildcard(entry: &str) -> bool {
    entry.contains(['*', '?'])
}

/// Translate a wildcard pattern to an anchored regex source.
///
/// `*` becomes `.*`, `?` becomes `.`, everything else is escaped.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');
    source
}

/// Compiled form of one name-entry list.
#[derive(Debug, Default)]
pub struct NameMatcher {
    exact: FxHashSet<String>,
    patterns: Vec<Regex>,
}

impl NameMatcher {
    pub fn compile(entries: &[String]) -> Self {
        let mut matcher = NameMatcher::default();
        for entry in entries {
            if !is_wildcard(entry) {
                matcher.exact.insert(entry.to_lowercase());
                continue;
            }
            match RegexBuilder::new(&wildcard_to_regex(entry))
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => matcher.patterns.push(regex),
                // Escaping leaves only size limits to trip over.
                Err(e) => tracing::warn!(pattern = %entry, "ignoring filter pattern: {e}"),
            }
        }
        matcher
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        (!self.exact.is_empty() && self.exact.contains(&name.to_lowercase()))
            || self.patterns.iter().any(|p| p.is_match(name))
    }
}
