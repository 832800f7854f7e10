mod percentiles;

pub use percentiles::PercentileSet;

use serde::Serialize;

/// Read-only view of one identifier's history, shipped to the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct TimerSnapshot {
    pub ident: String,
    pub count: usize,
    /// Seconds.
    pub sum: f64,
    /// Seconds; 0.0 when nothing was recorded.
    pub average: f64,
    pub latency: PercentileSet,
}
