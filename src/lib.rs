//! Scoped timing regions with a bounded per-identifier sample history.
//!
//! Samples live either in process memory ([`MemoryStore`]) or in Redis
//! lists ([`RedisStore`]) so several processes can share one set of timers
//! or feed a dashboard.

pub mod clock;
pub mod error;
pub mod events;
pub mod metrics;
pub mod store;
pub mod timer;

pub use error::TimerError;
pub use events::{EventBus, TimerEnd, TIMER_END_SIGNAL};
pub use metrics::{PercentileSet, TimerSnapshot};
pub use store::{
    ListConnection, MemoryStore, RedisStore, SampleStore, Samples, DEFAULT_LIMIT,
};
pub use timer::{ScopedRegion, Timer};
