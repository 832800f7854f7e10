use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use super::{check_limit, SampleStore, Samples, DEFAULT_LIMIT};
use crate::TimerError;

/// In-process store: one ring of at most `limit` samples per identifier.
///
/// A single mutex guards the whole map, so the store may be shared between
/// threads. Iteration hands out a copy taken under the lock.
#[derive(Debug)]
pub struct MemoryStore {
    limit: usize,
    histories: Mutex<HashMap<String, VecDeque<f64>>>,
}

impl MemoryStore {
    pub fn new(limit: usize) -> Result<Self, TimerError> {
        Ok(Self {
            limit: check_limit(limit)?,
            histories: Mutex::new(HashMap::new()),
        })
    }

    /// Runs `f` on the history for `ident`, creating an empty one first if
    /// the identifier has not been seen.
    fn with_history<R>(
        &self,
        ident: &str,
        f: impl FnOnce(&mut VecDeque<f64>) -> R,
    ) -> R {
        let mut histories = self.histories.lock();
        let history = histories
            .entry(ident.to_owned())
            .or_default();
        f(history)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            histories: Mutex::new(HashMap::new()),
        }
    }
}

impl SampleStore for MemoryStore {
    fn contains(&self, ident: &str) -> Result<bool, TimerError> {
        Ok(self.histories.lock().contains_key(ident))
    }

    fn len(&self, ident: &str) -> Result<usize, TimerError> {
        Ok(self.histories.lock().get(ident).map_or(0, VecDeque::len))
    }

    fn samples(&self, ident: &str) -> Result<Samples, TimerError> {
        let snapshot: Vec<f64> = self
            .histories
            .lock()
            .get(ident)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn append(&self, ident: &str, value: f64) -> Result<(), TimerError> {
        let limit = self.limit;
        self.with_history(ident, |history| {
            history.push_back(value);
            while history.len() > limit {
                history.pop_front();
            }
        });
        Ok(())
    }

    fn limit(&self) -> usize {
        self.limit
    }
}
