use hdrhistogram::Histogram;
use serde::Serialize;

use crate::TimerError;

/// 3 significant figures, auto-resizing.
const HIST_SIGFIG: u8 = 3;

/// Percentile breakdown of one history, in microseconds.
/// Serialized straight into the dashboard JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PercentileSet {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub p999: u64,
    pub count: u64,
}

impl PercentileSet {
    /// Build from samples measured in seconds. Each sample is clamped to at
    /// least 1 μs so that zero and negative durations still count.
    pub fn from_seconds(samples: &[f64]) -> Result<Self, TimerError> {
        if samples.is_empty() {
            return Ok(Self::empty());
        }

        let mut hist = Histogram::<u64>::new(HIST_SIGFIG)?;
        for s in samples {
            let us = (s * 1_000_000.0).round().max(1.0) as u64;
            hist.saturating_record(us);
        }
        Ok(Self::from_histogram(&hist))
    }

    pub fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_percentile(50.0),
            p95: hist.value_at_percentile(95.0),
            p99: hist.value_at_percentile(99.0),
            p999: hist.value_at_percentile(99.9),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used before any samples are recorded.
    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p95: 0,
            p99: 0,
            p999: 0,
            count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}
