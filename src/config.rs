//! Cold tier configuration
//!
//! Environment:
//! - COLD_EVENTS_ENABLED: master switch (`true`/`false`/`1`/`0`, default false)
//! - COLD_EVENTS_PULL_INTERVAL_SECS: cycle period and lease duration (default 1800)
//! - COLD_EVENTS_SAFE_WINDOW_SECS: archival safety margin (default 120)
//! - COLD_EVENTS_SEGMENT_MAX_EVENTS: events per segment (default 100000)
//! - COLD_EVENTS_SEGMENT_MAX_BYTES: payload bytes per segment (default 512 MiB)

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ColdError, ColdResult};

pub const DEFAULT_PULL_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SAFE_WINDOW: Duration = Duration::from_secs(2 * 60);
pub const DEFAULT_SEGMENT_MAX_EVENTS: usize = 100_000;
pub const DEFAULT_SEGMENT_MAX_BYTES: u64 = 512 * 1024 * 1024;

/// Options recognized by the exporter, catalog and hybrid reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColdEventStoreConfig {
    /// Master switch
    pub enabled: bool,
    /// Export cycle period; also the lease duration
    #[serde(rename = "pullIntervalSecs", with = "duration_secs")]
    pub pull_interval: Duration,
    /// Events younger than this are never archived
    #[serde(rename = "safeWindowSecs", with = "duration_secs")]
    pub safe_window: Duration,
    /// Maximum events per segment
    pub segment_max_events: usize,
    /// Best-effort maximum payload bytes per segment
    pub segment_max_bytes: u64,
}

impl Default for ColdEventStoreConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pull_interval: DEFAULT_PULL_INTERVAL,
            safe_window: DEFAULT_SAFE_WINDOW,
            segment_max_events: DEFAULT_SEGMENT_MAX_EVENTS,
            segment_max_bytes: DEFAULT_SEGMENT_MAX_BYTES,
        }
    }
}

impl ColdEventStoreConfig {
    /// Defaults with the master switch on
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_pull_interval(mut self, pull_interval: Duration) -> Self {
        self.pull_interval = pull_interval;
        self
    }

    pub fn with_safe_window(mut self, safe_window: Duration) -> Self {
        self.safe_window = safe_window;
        self
    }

    pub fn with_segment_bounds(mut self, max_events: usize, max_bytes: u64) -> Self {
        self.segment_max_events = max_events;
        self.segment_max_bytes = max_bytes;
        self
    }

    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> ColdResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup (used by `from_env`)
    pub fn from_lookup<F>(lookup: F) -> ColdResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup("COLD_EVENTS_ENABLED") {
            config.enabled = parse_bool("COLD_EVENTS_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("COLD_EVENTS_PULL_INTERVAL_SECS") {
            config.pull_interval =
                Duration::from_secs(parse_number("COLD_EVENTS_PULL_INTERVAL_SECS", &raw)?);
        }
        if let Some(raw) = lookup("COLD_EVENTS_SAFE_WINDOW_SECS") {
            config.safe_window =
                Duration::from_secs(parse_number("COLD_EVENTS_SAFE_WINDOW_SECS", &raw)?);
        }
        if let Some(raw) = lookup("COLD_EVENTS_SEGMENT_MAX_EVENTS") {
            config.segment_max_events = parse_number("COLD_EVENTS_SEGMENT_MAX_EVENTS", &raw)?;
        }
        if let Some(raw) = lookup("COLD_EVENTS_SEGMENT_MAX_BYTES") {
            config.segment_max_bytes = parse_number("COLD_EVENTS_SEGMENT_MAX_BYTES", &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject bounds that would stall the exporter
    pub fn validate(&self) -> ColdResult<()> {
        if self.pull_interval.is_zero() {
            return Err(ColdError::invalid_config("pull interval must be positive"));
        }
        if self.segment_max_events == 0 {
            return Err(ColdError::invalid_config("segment max events must be positive"));
        }
        if self.segment_max_bytes == 0 {
            return Err(ColdError::invalid_config("segment max bytes must be positive"));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> ColdResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ColdError::invalid_config(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> ColdResult<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ColdError::invalid_config(format!("{key}: expected a number, got {raw:?}")))
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
