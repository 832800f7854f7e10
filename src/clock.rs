//! Time sources for scoped regions. Every source returns seconds as `f64`.

use std::sync::OnceLock;
use std::time::Instant;

/// Wall-clock seconds since the Unix epoch. Not monotonic.
pub fn wall() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) / 1e9
}

/// Seconds since the first call in this process. Never goes backwards.
pub fn monotonic() -> f64 {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    ANCHOR.get_or_init(Instant::now).elapsed().as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_never_decreases() {
        let a = monotonic();
        let b = monotonic();
        assert!(b >= a);
    }

    #[test]
    fn wall_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(wall() > 1_577_836_800.0);
    }
}
