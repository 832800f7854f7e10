use std::sync::Arc;

use tracing::{trace, warn};
use uuid::Uuid;

use crate::clock;
use crate::events::{EventBus, TimerEnd, TIMER_END_SIGNAL};
use crate::metrics::{PercentileSet, TimerSnapshot};
use crate::store::{MemoryStore, SampleStore};
use crate::TimerError;

/// Measures scoped regions and answers questions about their history.
///
/// ```
/// use redis_timer::Timer;
///
/// let timer = Timer::new();
/// let answer = timer.measure("compute", || 6 * 7).unwrap();
/// assert_eq!(answer, 42);
/// assert!(timer.estimate("compute", 10).unwrap().is_some());
/// ```
pub struct Timer {
    id: Uuid,
    store: Arc<dyn SampleStore>,
    events: Option<EventBus>,
}

impl Timer {
    /// In-memory timer keeping the default number of samples per identifier.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::default()))
    }

    /// In-memory timer keeping `limit` samples per identifier.
    pub fn with_limit(limit: usize) -> Result<Self, TimerError> {
        Ok(Self::with_store(Arc::new(MemoryStore::new(limit)?)))
    }

    pub fn with_store(store: Arc<dyn SampleStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            events: None,
        }
    }

    /// Announce every finished region on `bus`.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Instance id carried by the events this timer publishes.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &Arc<dyn SampleStore> {
        &self.store
    }

    pub fn events(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    /// Start a region timed with the wall clock.
    pub fn region(&self, ident: &str) -> ScopedRegion<'_> {
        self.region_with(ident, clock::wall as fn() -> f64)
    }

    /// Start a region timed with `clock`, read once on entry and once on exit.
    pub fn region_with<F>(&self, ident: &str, clock: F) -> ScopedRegion<'_, F>
    where
        F: Fn() -> f64,
    {
        let start = clock();
        ScopedRegion {
            timer: self,
            ident: ident.to_owned(),
            clock,
            start,
            finished: false,
        }
    }

    /// Run `body` inside a wall-clock region.
    ///
    /// Whatever `body` returns is handed back untouched, `Err` values
    /// included. A panic in `body` still records the sample before it
    /// unwinds further. If recording fails the body's output is dropped and
    /// the store error returned instead.
    pub fn measure<T>(
        &self,
        ident: &str,
        body: impl FnOnce() -> T,
    ) -> Result<T, TimerError> {
        self.measure_with(ident, clock::wall, body)
    }

    pub fn measure_with<T, F>(
        &self,
        ident: &str,
        clock: F,
        body: impl FnOnce() -> T,
    ) -> Result<T, TimerError>
    where
        F: Fn() -> f64,
    {
        let region = self.region_with(ident, clock);
        let out = body();
        region.finish()?;
        Ok(out)
    }

    /// Sum of the retained samples, 0.0 when there are none.
    pub fn sum(&self, ident: &str) -> Result<f64, TimerError> {
        Ok(self.retained(ident)?.map_or(0.0, |s| s.iter().sum()))
    }

    /// Mean of the retained samples, 0.0 when there are none.
    pub fn average(&self, ident: &str) -> Result<f64, TimerError> {
        Ok(self.retained(ident)?.map_or(0.0, |s| mean(&s)))
    }

    /// Expected time for `remaining` more runs, or `None` without history.
    ///
    /// Unlike [`sum`](Self::sum) and [`average`](Self::average) this tells
    /// "no data yet" apart from a genuine zero.
    pub fn estimate(
        &self,
        ident: &str,
        remaining: u64,
    ) -> Result<Option<f64>, TimerError> {
        Ok(self
            .retained(ident)?
            .map(|s| mean(&s) * remaining as f64))
    }

    pub fn snapshot(&self, ident: &str) -> Result<TimerSnapshot, TimerError> {
        let samples = self.retained(ident)?.unwrap_or_default();
        Ok(TimerSnapshot {
            ident: ident.to_owned(),
            count: samples.len(),
            sum: samples.iter().sum(),
            average: if samples.is_empty() { 0.0 } else { mean(&samples) },
            latency: PercentileSet::from_seconds(&samples)?,
        })
    }

    /// Retained samples, or `None` when the identifier has no history.
    fn retained(&self, ident: &str) -> Result<Option<Vec<f64>>, TimerError> {
        if !self.store.contains(ident)? {
            return Ok(None);
        }
        let samples = self
            .store
            .samples(ident)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok((!samples.is_empty()).then_some(samples))
    }

    /// Store `end - start` for a span measured elsewhere and announce it
    /// like a finished region. Returns the stored duration.
    pub fn record(
        &self,
        ident: &str,
        start: f64,
        end: f64,
    ) -> Result<f64, TimerError> {
        let delta = end - start;
        self.store.append(ident, delta)?;
        trace!(timer = %self.id, ident, delta, "region finished");

        if let Some(bus) = &self.events {
            bus.publish(TimerEnd {
                signal: TIMER_END_SIGNAL,
                timer: self.id,
                ident: ident.to_owned(),
                start,
                end,
            });
        }
        Ok(delta)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// A running measurement. Finishing it (explicitly or by dropping it,
/// including during a panic) appends exactly one sample.
#[must_use = "a region records its sample when it is finished or dropped"]
pub struct ScopedRegion<'t, F = fn() -> f64>
where
    F: Fn() -> f64,
{
    timer: &'t Timer,
    ident: String,
    clock: F,
    start: f64,
    finished: bool,
}

impl<F: Fn() -> f64> ScopedRegion<'_, F> {
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    /// Close the region now and return the recorded duration.
    pub fn finish(mut self) -> Result<f64, TimerError> {
        self.finished = true;
        self.complete()
    }

    fn complete(&self) -> Result<f64, TimerError> {
        let end = (self.clock)();
        self.timer.record(&self.ident, self.start, end)
    }
}

impl<F: Fn() -> f64> Drop for ScopedRegion<'_, F> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Err(e) = self.complete() {
            warn!(ident = %self.ident, error = %e, "could not record region");
        }
    }
}
