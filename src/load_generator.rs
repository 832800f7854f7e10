use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use redis_timer::{clock, Timer, TimerError};
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Timed with the monotonic clock.
pub const CLOCK_IDENT: &str = "One_clock";
/// Timed with the wall clock.
pub const TIME_IDENT: &str = "One_time";

/// Mersenne prime 2^61 - 1.
const MODULUS: u64 = (1 << 61) - 1;

// ─── Public entry point ──────────────────────────────────────────

/// Runs `workers` blocking workers until each finished `iterations` jobs
/// or the `running` flag is cleared.
pub async fn run(
    running: Arc<AtomicBool>,
    timer: Arc<Timer>,
    workers: u32,
    iterations: u32,
    exponent: u32,
) {
    let mut handles = Vec::with_capacity(workers as usize);

    for worker_id in 0..workers {
        let running = running.clone();
        let timer = timer.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            if let Err(e) = worker(worker_id, &running, &timer, iterations, exponent) {
                warn!(worker = worker_id, error = %e, "worker aborted");
            }
        }));
    }

    for h in handles {
        let _ = h.await;
    }

    // Mark workload as finished
    running.store(false, Ordering::SeqCst);
    log_totals(timer).await;
}

async fn log_totals(timer: Arc<Timer>) {
    let totals = tokio::task::spawn_blocking(move || -> Result<_, TimerError> {
        Ok([
            (CLOCK_IDENT, timer.sum(CLOCK_IDENT)?, timer.average(CLOCK_IDENT)?),
            (TIME_IDENT, timer.sum(TIME_IDENT)?, timer.average(TIME_IDENT)?),
        ])
    })
    .await;

    match totals {
        Ok(Ok(rows)) => {
            for (ident, sum, avg) in rows {
                info!(ident, sum_secs = sum, avg_secs = avg, "workload totals");
            }
        }
        Ok(Err(e)) => warn!(error = %e, "could not read workload totals"),
        Err(e) => warn!(error = %e, "totals task failed"),
    }
}

// ─── Worker loop ─────────────────────────────────────────────────

fn worker(
    id: u32,
    running: &AtomicBool,
    timer: &Timer,
    iterations: u32,
    exponent: u32,
) -> Result<(), TimerError> {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);

    for i in 0..iterations {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let base = rng.gen_range(2..MODULUS);
        timer.measure_with(CLOCK_IDENT, clock::monotonic, || {
            black_box(square_chain(base, exponent))
        })?;
        timer.measure(TIME_IDENT, || black_box(square_chain(base, exponent)))?;

        let remaining = u64::from(iterations - i);
        if let Some(estimate) = timer.estimate(TIME_IDENT, remaining)? {
            info!(worker = id, remaining, estimate_secs = estimate, "time left");
        }
    }
    Ok(())
}

/// Squares `x` modulo [`MODULUS`] 2^exponent times.
fn square_chain(mut x: u64, exponent: u32) -> u64 {
    for _ in 0..(1u64 << exponent) {
        x = ((u128::from(x) * u128::from(x)) % u128::from(MODULUS)) as u64;
    }
    x
}
