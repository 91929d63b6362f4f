//! Engine configuration.
//!
//! Configuration is a plain struct with sensible defaults. It can be built
//! in code, read from JSON, and overridden from `SQLAGENT_*` environment
//! variables before being validated once at engine start-up.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "SQLAGENT_";

/// Errors returned while loading or validating configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The JSON document could not be decoded.
    #[error("invalid configuration document: {0}")]
    InvalidDocument(String),

    /// An environment override could not be parsed.
    #[error("invalid value '{value}' for {key}")]
    InvalidOverride {
        /// Environment variable name.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },

    /// A setting that must be positive is zero.
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

/// Tuning parameters for the optimisation engine.
///
/// # Examples
///
/// ```
/// use sqlagent::config::EngineConfig;
///
/// let config = EngineConfig::default().with_max_workers(8);
/// assert_eq!(config.max_workers, 8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of worker executors (N).
    pub max_workers: usize,
    /// Maximum number of tasks pending or running at once (M).
    pub queue_capacity: usize,
    /// Wall-clock deadline for one task, in milliseconds.
    pub task_timeout_ms: u64,
    /// How long finished tasks stay queryable, in seconds.
    pub retention_secs: u64,
    /// Interval between background eviction sweeps, in seconds.
    pub eviction_interval_secs: u64,
    /// Row bound appended to unbounded queries.
    pub default_row_limit: u64,
    /// Maximum advisor attempts, including repairs.
    pub advisor_max_attempts: u32,
    /// Deadline for one advisor call, in milliseconds.
    pub advisor_timeout_ms: u64,
    /// Deadline for one statistics lookup, in milliseconds.
    pub statistics_timeout_ms: u64,
    /// Maximum number of query rewrites running at once within a task.
    pub rewrite_parallelism: usize,
    /// Catalog used when neither the URL nor the schema names one.
    pub default_catalog: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            queue_capacity: 64,
            task_timeout_ms: 15 * 60 * 1000,
            retention_secs: 24 * 60 * 60,
            eviction_interval_secs: 60,
            default_row_limit: 10_000,
            advisor_max_attempts: 3,
            advisor_timeout_ms: 60 * 1000,
            statistics_timeout_ms: 5 * 1000,
            rewrite_parallelism: 6,
            default_catalog: "default".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Creates a small-footprint configuration with short deadlines.
    ///
    /// Useful for tests and local experiments.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            max_workers: 2,
            queue_capacity: 8,
            task_timeout_ms: 10 * 1000,
            eviction_interval_secs: 1,
            advisor_timeout_ms: 2 * 1000,
            statistics_timeout_ms: 500,
            rewrite_parallelism: 2,
            ..Self::default()
        }
    }

    /// Decodes configuration from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDocument`] when the document is not
    /// valid JSON for this struct.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(|err| ConfigError::InvalidDocument(err.to_string()))
    }

    /// Applies `SQLAGENT_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when a variable is set to a
    /// value that does not parse.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Keys are the upper-cased field names with the `SQLAGENT_` prefix,
    /// for example `SQLAGENT_MAX_WORKERS`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] when a value does not parse.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        override_value(&lookup, "MAX_WORKERS", &mut self.max_workers)?;
        override_value(&lookup, "QUEUE_CAPACITY", &mut self.queue_capacity)?;
        override_value(&lookup, "TASK_TIMEOUT_MS", &mut self.task_timeout_ms)?;
        override_value(&lookup, "RETENTION_SECS", &mut self.retention_secs)?;
        override_value(&lookup, "EVICTION_INTERVAL_SECS", &mut self.eviction_interval_secs)?;
        override_value(&lookup, "DEFAULT_ROW_LIMIT", &mut self.default_row_limit)?;
        override_value(&lookup, "ADVISOR_MAX_ATTEMPTS", &mut self.advisor_max_attempts)?;
        override_value(&lookup, "ADVISOR_TIMEOUT_MS", &mut self.advisor_timeout_ms)?;
        override_value(&lookup, "STATISTICS_TIMEOUT_MS", &mut self.statistics_timeout_ms)?;
        override_value(&lookup, "REWRITE_PARALLELISM", &mut self.rewrite_parallelism)?;
        if let Some(catalog) = lookup(&format!("{ENV_PREFIX}DEFAULT_CATALOG")) {
            self.default_catalog = catalog;
        }
        Ok(self)
    }

    /// Sets the number of workers.
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the admission capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    /// Sets the per-task deadline.
    #[must_use]
    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Sets the retention window for finished tasks.
    #[must_use]
    pub const fn with_retention(mut self, retention: Duration) -> Self {
        self.retention_secs = retention.as_secs();
        self
    }

    /// Sets the advisor attempt ceiling.
    #[must_use]
    pub const fn with_advisor_max_attempts(mut self, attempts: u32) -> Self {
        self.advisor_max_attempts = attempts;
        self
    }

    /// Sets the per-call advisor deadline.
    #[must_use]
    pub fn with_advisor_timeout(mut self, timeout: Duration) -> Self {
        self.advisor_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Returns the per-task deadline.
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    /// Returns the retention window for finished tasks.
    #[must_use]
    pub const fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Returns the eviction sweep interval.
    #[must_use]
    pub const fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_secs)
    }

    /// Returns the per-call advisor deadline.
    #[must_use]
    pub const fn advisor_timeout(&self) -> Duration {
        Duration::from_millis(self.advisor_timeout_ms)
    }

    /// Returns the per-table statistics deadline.
    #[must_use]
    pub const fn statistics_timeout(&self) -> Duration {
        Duration::from_millis(self.statistics_timeout_ms)
    }

    /// Checks that every bounded resource is positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MustBePositive`] naming the first zero setting.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::MustBePositive("max_workers"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::MustBePositive("queue_capacity"));
        }
        if self.task_timeout_ms == 0 {
            return Err(ConfigError::MustBePositive("task_timeout_ms"));
        }
        if self.advisor_max_attempts == 0 {
            return Err(ConfigError::MustBePositive("advisor_max_attempts"));
        }
        if self.rewrite_parallelism == 0 {
            return Err(ConfigError::MustBePositive("rewrite_parallelism"));
        }
        if self.default_row_limit == 0 {
            return Err(ConfigError::MustBePositive("default_row_limit"));
        }
        if self.eviction_interval_secs == 0 {
            return Err(ConfigError::MustBePositive("eviction_interval_secs"));
        }
        Ok(())
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn override_value<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    field: &str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    let key = format!("{ENV_PREFIX}{field}");
    let Some(value) = lookup(&key) else {
        return Ok(());
    };
    *slot = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { key, value })?;
    Ok(())
}
