use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Name under which completed regions are announced.
pub const TIMER_END_SIGNAL: &str = "timer_end";

/// Published once per finished scoped region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerEnd {
    pub signal: &'static str,
    /// Instance id of the `Timer` that owned the region.
    pub timer: Uuid,
    pub ident: String,
    pub start: f64,
    pub end: f64,
}

impl TimerEnd {
    pub fn elapsed(&self) -> f64 {
        self.end - self.start
    }
}

/// Fan-out channel for [`TimerEnd`] events.
///
/// Cloning shares the channel. Subscribers that fall more than `capacity`
/// events behind lose the oldest ones.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TimerEnd>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerEnd> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send to current subscribers. Having none is not an error.
    pub fn publish(&self, event: TimerEnd) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
