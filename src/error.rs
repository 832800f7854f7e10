use thiserror::Error;

/// Everything that can go wrong while storing or reading samples.
#[derive(Debug, Error)]
pub enum TimerError {
    /// Invalid store setup, e.g. a zero history limit.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The Redis server could not be reached or rejected a command.
    #[error("redis: {0}")]
    Connectivity(#[from] redis::RedisError),

    /// A stored entry is not a decimal float.
    #[error("malformed sample {value:?} under key {key:?}")]
    Parse { key: String, value: String },

    #[error("histogram: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),
}
