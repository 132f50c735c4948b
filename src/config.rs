//! Scheduler configuration.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic** — values set via builder methods
//! 2. **Environment variables** — `SETTLE_*` overrides
//! 3. **Defaults** — [`SchedulerConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `SETTLE_TRACE_CAPACITY` | `usize` | `trace_capacity` |
//! | `SETTLE_MAX_STEPS` | `u64` | `max_steps` (`0` disables the limit) |
//! | `SETTLE_AUTO_ADVANCE` | `bool` | `auto_advance` |

use thiserror::Error;

/// Environment variable name for the trace buffer capacity.
pub const ENV_TRACE_CAPACITY: &str = "SETTLE_TRACE_CAPACITY";
/// Environment variable name for the scheduler step limit.
pub const ENV_MAX_STEPS: &str = "SETTLE_MAX_STEPS";
/// Environment variable name for automatic virtual time advancement.
pub const ENV_AUTO_ADVANCE: &str = "SETTLE_AUTO_ADVANCE";

/// Error raised when an environment override cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable was set but its value did not parse as the expected type.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        /// The environment variable name.
        var: &'static str,
        /// The raw value found in the environment.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Configuration for the [`Scheduler`](crate::runtime::Scheduler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Capacity of the scheduler's trace ring buffer.
    pub trace_capacity: usize,
    /// Maximum number of task polls before the scheduler gives up.
    ///
    /// `None` disables the limit. The limit is a backstop against tasks
    /// that busy-wake forever; well-behaved workloads never reach it.
    pub max_steps: Option<u64>,
    /// Whether the scheduler advances virtual time to the earliest pending
    /// timer when no task is runnable.
    ///
    /// Disable this to drive time manually with
    /// [`Scheduler::advance_time`](crate::runtime::Scheduler::advance_time).
    pub auto_advance: bool,
}

impl SchedulerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            trace_capacity: 1024,
            max_steps: Some(1_000_000),
            auto_advance: true,
        }
    }

    /// Sets the trace buffer capacity.
    #[must_use]
    pub const fn trace_capacity(mut self, capacity: usize) -> Self {
        self.trace_capacity = capacity;
        self
    }

    /// Sets the maximum number of scheduler steps.
    #[must_use]
    pub const fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// Disables the step limit.
    #[must_use]
    pub const fn no_step_limit(mut self) -> Self {
        self.max_steps = None;
        self
    }

    /// Sets whether virtual time auto-advances when idle.
    #[must_use]
    pub const fn auto_advance(mut self, value: bool) -> Self {
        self.auto_advance = value;
        self
    }

    /// Creates a configuration from defaults plus environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Applies `SETTLE_*` environment overrides to this configuration.
    ///
    /// Only variables that are set are applied. Returns an error if a
    /// variable is set but contains an unparseable value.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(val) = read_env(ENV_TRACE_CAPACITY) {
            self.trace_capacity = parse_number::<usize>(ENV_TRACE_CAPACITY, &val)?;
        }
        if let Some(val) = read_env(ENV_MAX_STEPS) {
            let steps = parse_number::<u64>(ENV_MAX_STEPS, &val)?;
            self.max_steps = if steps == 0 { None } else { Some(steps) };
        }
        if let Some(val) = read_env(ENV_AUTO_ADVANCE) {
            self.auto_advance = parse_bool(ENV_AUTO_ADVANCE, &val)?;
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn read_env(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
