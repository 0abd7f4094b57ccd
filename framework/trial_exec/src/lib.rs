//! Trial Exec - scheduling and running of discovered tests.
//!
//! [`TestScheduler`] takes the units discovery produced, orders them,
//! runs collections in parallel where allowed and publishes every
//! lifecycle message on the bus. [`FrontController`] ties discovery,
//! filtering and scheduling together.

mod cancel;
mod config;
mod controller;
mod invoker;
mod plan;
mod scheduler;
mod summary;

pub use cancel::CancellationToken;
pub use config::{ConfigError, MaxThreads, RunnerConfig};
pub use controller::FrontController;
pub use invoker::{HookPhase, Invocation, InvocationOutcome, Invoker};
pub use scheduler::TestScheduler;
pub use summary::{CollectionSummary, RunSummary, TestOutcome, TestResult};

static TRACING_INIT: std::sync::Once = std::sync::Once::new();

/// Install a tracing subscriber when `RUST_LOG` is set.
///
/// Safe to call more than once; only the first call does anything.
///
/// ```bash
/// RUST_LOG=trial_exec=debug,trial::discovery=warn
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
