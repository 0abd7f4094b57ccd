//! Pre-enumeration vs. delayed enumeration of theory data.
//!
//! A theory is either fully known at discovery time (one unit per data row)
//! or fully deferred (one unit that fetches its rows when it runs). There is
//! no partial expansion: any source that cannot be enumerated defers the
//! whole method.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rustc_hash::FxHashSet;
use trial_ir::{serialize_arguments, ArgumentSerializationError, DataError, DataRow};

use crate::context::MethodContext;
use crate::diagnostics::panic_message;

/// Why a theory was left for execution time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelayReason {
    /// Pre-enumeration is off for this run.
    OptionsDisabled,
    /// The method's marker opted out.
    MarkerDisabled,
    /// A data source opted out.
    SourceDisabled { source: String },
    /// A data source failed or panicked.
    SourceFailed { source: String, error: String },
    /// A row holds a value that cannot be serialized.
    NotSerializable { source: String, type_name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum TheoryDecision {
    /// One entry per distinct row, with its serialized arguments.
    PreEnumerated(Vec<(DataRow, String)>),
    Delayed(DelayReason),
    /// Every source was enumerated and none produced a row.
    NoData,
    /// A source exists but returned null.
    NullData { source: String },
}

/// Decide how the theory in `ctx` expands.
///
/// Conditions are checked in order; the first failing one decides. Source
/// failures and serialization failures are reported as diagnostics.
pub fn decide(ctx: &MethodContext<'_>) -> TheoryDecision {
    if !ctx.options.pre_enumerate_theories {
        return TheoryDecision::Delayed(DelayReason::OptionsDisabled);
    }
    if ctx.marker.disable_discovery_enumeration {
        return TheoryDecision::Delayed(DelayReason::MarkerDisabled);
    }
    let sources = &ctx.method.data_sources;
    if let Some(source) = sources.iter().find(|s| !s.supports_discovery_enumeration()) {
        return TheoryDecision::Delayed(DelayReason::SourceDisabled {
            source: source.name().to_string(),
        });
    }

    let qualified = ctx.qualified_name();
    let mut rows = Vec::new();
    let mut seen = FxHashSet::default();
    for source in sources {
        let fetched = catch_unwind(AssertUnwindSafe(|| source.rows()))
            .unwrap_or_else(|payload| Err(DataError::Failed(panic_message(payload.as_ref()))));
        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(DataError::Null) => {
                return TheoryDecision::NullData {
                    source: source.name().to_string(),
                };
            }
            Err(DataError::Failed(error)) => {
                ctx.report(format!(
                    "Exception thrown during theory discovery on '{qualified}' from data source '{}'; falling back to single test case. {error}",
                    source.name()
                ));
                return TheoryDecision::Delayed(DelayReason::SourceFailed {
                    source: source.name().to_string(),
                    error,
                });
            }
        };

        for row in fetched {
            let serialized = match serialize_arguments(&row.arguments) {
                Ok(serialized) => serialized,
                Err(error) => {
                    let type_name = match error {
                        ArgumentSerializationError::NotSerializable { type_name } => type_name,
                        ArgumentSerializationError::Encode(e) => e.to_string(),
                    };
                    ctx.report(format!(
                        "Non-serializable data (of type '{type_name}') found for '{qualified}' from data source '{}'; falling back to single test case.",
                        source.name()
                    ));
                    return TheoryDecision::Delayed(DelayReason::NotSerializable {
                        source: source.name().to_string(),
                        type_name,
                    });
                }
            };
            if !seen.insert(serialized.clone()) {
                ctx.report(format!(
                    "Skipping duplicate data row {serialized} for '{qualified}' from data source '{}'",
                    source.name()
                ));
                continue;
            }
            rows.push((row, serialized));
        }
    }

    if rows.is_empty() {
        TheoryDecision::NoData
    } else {
        TheoryDecision::PreEnumerated(rows)
    }
}
