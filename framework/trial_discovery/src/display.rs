//! Display names for discovered units.

use trial_ir::{Parameter, TestMethod, Value};

use crate::options::MethodDisplay;
use crate::source::TestMarker;

/// Base display name of a method's units: the marker override, otherwise
/// the method name qualified according to `display`.
pub fn base_name(method: &TestMethod, marker: &TestMarker, display: MethodDisplay) -> String {
    if let Some(name) = &marker.display_name {
        return name.clone();
    }
    match display {
        MethodDisplay::ClassAndMethod => method.qualified_name(),
        MethodDisplay::Method => method.name.clone(),
    }
}

/// `base(p1: v1, p2: v2)`.
///
/// A required parameter without an argument renders `name: ???`; an
/// optional one renders nothing. Surplus arguments render `???: value`.
pub fn format_arguments(base: &str, parameters: &[Parameter], arguments: &[Value]) -> String {
    let mut rendered = Vec::with_capacity(parameters.len().max(arguments.len()));
    for (index, parameter) in parameters.iter().enumerate() {
        match arguments.get(index) {
            Some(value) => rendered.push(format!("{}: {value}", parameter.name)),
            None if parameter.optional => {}
            None => rendered.push(format!("{}: ???", parameter.name)),
        }
    }
    for value in arguments.iter().skip(parameters.len()) {
        rendered.push(format!("???: {value}"));
    }

    format!("{base}({})", rendered.join(", "))
}

#[cfg(test)]
mod tests;
