use std::str::FromStr;
use std::time::Duration;

use redis_timer::store::check_limit;
use redis_timer::{TimerError, DEFAULT_LIMIT};

// ─── Defaults ────────────────────────────────────────────────────

const DEFAULT_PREFIX: &str = "timer:";
const DEFAULT_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REDIS_TIMEOUT_MS: u64 = 2_000;

/// Process settings, read from `TIMER_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Shared Redis store when set, in-memory store otherwise.
    pub redis_url: Option<String>,
    /// Namespace for every Redis key this process writes.
    pub prefix: String,
    /// Samples kept per identifier.
    pub limit: usize,
    pub addr: String,
    pub redis_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, TimerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TimerError> {
        let limit: usize = parsed(&lookup, "TIMER_LIMIT", DEFAULT_LIMIT)?;
        let limit = check_limit(limit).map_err(|e| {
            TimerError::Configuration(format!("TIMER_LIMIT: {e}"))
        })?;
        let timeout_ms: u64 =
            parsed(&lookup, "TIMER_REDIS_TIMEOUT_MS", DEFAULT_REDIS_TIMEOUT_MS)?;

        Ok(Self {
            redis_url: lookup("TIMER_REDIS_URL").filter(|u| !u.is_empty()),
            prefix: lookup("TIMER_PREFIX")
                .unwrap_or_else(|| DEFAULT_PREFIX.into()),
            limit,
            addr: lookup("TIMER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into()),
            redis_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, TimerError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            TimerError::Configuration(format!("{name}: invalid value {raw:?}"))
        }),
    }
}
