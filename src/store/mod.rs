mod memory;
mod redis_list;

pub use self::memory::MemoryStore;
pub use self::redis_list::{ListConnection, RedisStore};

use crate::TimerError;

/// History length used when no limit is given.
pub const DEFAULT_LIMIT: usize = 100;

/// Lazily produced samples of one history. Items after a failed one are
/// not guaranteed; items before it have already been handed out.
pub type Samples = Box<dyn Iterator<Item = Result<f64, TimerError>> + Send>;

/// Mapping from identifier to a bounded, ordered sequence of samples.
///
/// Histories spring into existence on first `append`; reading an unknown
/// identifier behaves like reading an empty history.
pub trait SampleStore: Send + Sync {
    /// Whether `ident` has ever been appended to.
    fn contains(&self, ident: &str) -> Result<bool, TimerError>;

    /// Number of retained samples for `ident`.
    fn len(&self, ident: &str) -> Result<usize, TimerError>;

    /// Snapshot of the retained samples. Calling again starts over.
    fn samples(&self, ident: &str) -> Result<Samples, TimerError>;

    /// Record `value`, evicting the oldest sample once the limit is hit.
    fn append(&self, ident: &str, value: f64) -> Result<(), TimerError>;

    /// Upper bound on the history length of every identifier.
    fn limit(&self) -> usize;
}

/// Limits must be at least 1 and fit an `isize`, the index type of Redis
/// list commands.
pub fn check_limit(limit: usize) -> Result<usize, TimerError> {
    if limit == 0 {
        return Err(TimerError::Configuration(
            "history limit must be at least 1".into(),
        ));
    }
    if isize::try_from(limit).is_err() {
        return Err(TimerError::Configuration(format!(
            "history limit must not exceed {}",
            isize::MAX
        )));
    }
    Ok(limit)
}

#[cfg(test)]
pub(crate) use self::redis_list::fake::FakeLists;
