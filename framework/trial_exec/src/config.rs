//! Runner configuration.

use std::num::NonZeroUsize;
use std::str::FromStr;

use trial_order::OrderingConfig;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "invalid max threads '{0}': must be 'default', 'unlimited', a positive number, or a multiplier in the form of '0.0x'"
    )]
    InvalidMaxThreads(String),
}

/// Bound on concurrently running collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaxThreads {
    /// One per available CPU.
    #[default]
    Default,
    /// One per parallel collection.
    Unlimited,
    Fixed(NonZeroUsize),
}

impl MaxThreads {
    /// Parse the text form against an explicit CPU count.
    ///
    /// Accepts `default` or `0`, `unlimited`, a positive integer, or a
    /// multiplier such as `1.5x` (a `,` decimal separator works too).
    pub fn parse_with_cpus(text: &str, cpus: usize) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidMaxThreads(text.to_string());
        match text {
            "default" | "0" => return Ok(MaxThreads::Default),
            "unlimited" => return Ok(MaxThreads::Unlimited),
            _ => {}
        }

        if let Some(multiplier) = text.strip_suffix(['x', 'X']) {
            let multiplier = multiplier.replace(',', ".");
            if multiplier.is_empty()
                || !multiplier.chars().all(|c| c.is_ascii_digit() || c == '.')
            {
                return Err(invalid());
            }
            let factor: f64 = multiplier.parse().map_err(|_| invalid())?;
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss,
                reason = "Thread counts are small and non-negative"
            )]
            let threads = (factor * cpus as f64) as usize;
            return Ok(MaxThreads::Fixed(
                NonZeroUsize::new(threads).unwrap_or(NonZeroUsize::MIN),
            ));
        }

        text.parse::<NonZeroUsize>()
            .map(MaxThreads::Fixed)
            .map_err(|_| invalid())
    }

    /// Worker threads to use for `work` parallel collections.
    pub fn thread_count(self, work: usize) -> usize {
        match self {
            MaxThreads::Default => available_cpus(),
            MaxThreads::Unlimited => work.max(1),
            MaxThreads::Fixed(n) => n.get(),
        }
    }
}

impl FromStr for MaxThreads {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        MaxThreads::parse_with_cpus(text, available_cpus())
    }
}

fn available_cpus() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Configuration for the test scheduler.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Bound on collections running at once.
    pub max_parallel_threads: MaxThreads,
    /// Run collections concurrently. When off, every collection runs alone.
    pub parallelize_collections: bool,
    /// Orderer per granularity.
    pub ordering: OrderingConfig,
    /// Stop dispatching after the first failure.
    pub stop_on_fail: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            max_parallel_threads: MaxThreads::Default,
            parallelize_collections: true,
            ordering: OrderingConfig::default(),
            stop_on_fail: false,
        }
    }
}
