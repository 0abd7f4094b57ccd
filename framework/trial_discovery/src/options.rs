//! Per-run discovery options.

/// How synthesized display names start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MethodDisplay {
    /// `Namespace.Class.Method`.
    #[default]
    ClassAndMethod,
    /// `Method` only.
    Method,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Expand theory data rows into separate units at discovery time.
    pub pre_enumerate_theories: bool,
    /// Discover types on a scoped worker pool instead of the calling thread.
    pub parallel: bool,
    /// Prefix used for synthesized display names.
    pub method_display: MethodDisplay,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        DiscoveryOptions {
            pre_enumerate_theories: true,
            parallel: false,
            method_display: MethodDisplay::default(),
        }
    }
}
