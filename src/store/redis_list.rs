use ::redis::RedisResult;
use parking_lot::Mutex;
use tracing::debug;

use super::{check_limit, SampleStore, Samples};
use crate::TimerError;

/// The five Redis list commands the shared store needs.
///
/// Implemented for a blocking `redis::Connection`; anything else that can
/// speak these commands (a pooled connection, a test double) can slot in.
pub trait ListConnection: Send {
    fn exists(&mut self, key: &str) -> RedisResult<bool>;
    fn llen(&mut self, key: &str) -> RedisResult<usize>;
    /// Whole list, head first.
    fn lrange_all(&mut self, key: &str) -> RedisResult<Vec<String>>;
    fn lpush(&mut self, key: &str, value: String) -> RedisResult<()>;
    fn ltrim(&mut self, key: &str, start: isize, stop: isize) -> RedisResult<()>;
}

impl ListConnection for ::redis::Connection {
    fn exists(&mut self, key: &str) -> RedisResult<bool> {
        ::redis::Commands::exists(self, key)
    }

    fn llen(&mut self, key: &str) -> RedisResult<usize> {
        ::redis::Commands::llen(self, key)
    }

    fn lrange_all(&mut self, key: &str) -> RedisResult<Vec<String>> {
        ::redis::Commands::lrange(self, key, 0, -1)
    }

    fn lpush(&mut self, key: &str, value: String) -> RedisResult<()> {
        ::redis::Commands::lpush(self, key, value)
    }

    fn ltrim(&mut self, key: &str, start: isize, stop: isize) -> RedisResult<()> {
        ::redis::Commands::ltrim(self, key, start, stop)
    }
}

/// Store backed by one Redis list per identifier, at `prefix + ident`.
///
/// New samples are pushed onto the head of the list, so iteration yields
/// the newest sample first. Appending is `LPUSH` followed by `LTRIM`, two
/// independent commands: another process reading in between can see one
/// sample more than the limit, and a crash in between leaves the list
/// long until the next append trims it.
pub struct RedisStore<C = ::redis::Connection> {
    conn: Mutex<C>,
    prefix: String,
    limit: usize,
}

impl<C: ListConnection> RedisStore<C> {
    pub fn new(
        conn: C,
        prefix: impl Into<String>,
        limit: usize,
    ) -> Result<Self, TimerError> {
        Ok(Self {
            conn: Mutex::new(conn),
            prefix: prefix.into(),
            limit: check_limit(limit)?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Redis key holding the history of `ident`.
    pub fn key(&self, ident: &str) -> String {
        format!("{}{}", self.prefix, ident)
    }
}

impl<C: ListConnection> SampleStore for RedisStore<C> {
    fn contains(&self, ident: &str) -> Result<bool, TimerError> {
        Ok(self.conn.lock().exists(&self.key(ident))?)
    }

    fn len(&self, ident: &str) -> Result<usize, TimerError> {
        Ok(self.conn.lock().llen(&self.key(ident))?)
    }

    fn samples(&self, ident: &str) -> Result<Samples, TimerError> {
        let key = self.key(ident);
        let raw = self.conn.lock().lrange_all(&key)?;
        Ok(Box::new(raw.into_iter().map(move |value| {
            match value.trim().parse::<f64>() {
                Ok(v) => Ok(v),
                Err(_) => Err(TimerError::Parse {
                    key: key.clone(),
                    value,
                }),
            }
        })))
    }

    fn append(&self, ident: &str, value: f64) -> Result<(), TimerError> {
        let key = self.key(ident);
        // `check_limit` keeps the limit within isize
        let stop = isize::try_from(self.limit - 1).unwrap_or(isize::MAX);
        let mut conn = self.conn.lock();
        conn.lpush(&key, value.to_string())?;
        conn.ltrim(&key, 0, stop)?;
        debug!(%key, value, limit = self.limit, "sample pushed");
        Ok(())
    }

    fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, VecDeque};

    use ::redis::{ErrorKind, RedisError, RedisResult};

    use super::ListConnection;

    /// In-process stand-in for a Redis server's list commands.
    #[derive(Default)]
    pub struct FakeLists {
        pub lists: HashMap<String, VecDeque<String>>,
        pub down: bool,
        pub log: Vec<&'static str>,
    }

    impl FakeLists {
        fn check(&mut self, op: &'static str) -> RedisResult<()> {
            self.log.push(op);
            if self.down {
                return Err(RedisError::from((
                    ErrorKind::IoError,
                    "connection refused",
                )));
            }
            Ok(())
        }
    }

    fn resolve(index: isize, len: usize) -> isize {
        if index < 0 {
            len as isize + index
        } else {
            index
        }
    }

    impl ListConnection for FakeLists {
        fn exists(&mut self, key: &str) -> RedisResult<bool> {
            self.check("EXISTS")?;
            Ok(self.lists.get(key).is_some_and(|l| !l.is_empty()))
        }

        fn llen(&mut self, key: &str) -> RedisResult<usize> {
            self.check("LLEN")?;
            Ok(self.lists.get(key).map_or(0, VecDeque::len))
        }

        fn lrange_all(&mut self, key: &str) -> RedisResult<Vec<String>> {
            self.check("LRANGE")?;
            Ok(self
                .lists
                .get(key)
                .map(|l| l.iter().cloned().collect())
                .unwrap_or_default())
        }

        fn lpush(&mut self, key: &str, value: String) -> RedisResult<()> {
            self.check("LPUSH")?;
            self.lists.entry(key.to_owned()).or_default().push_front(value);
            Ok(())
        }

        fn ltrim(&mut self, key: &str, start: isize, stop: isize) -> RedisResult<()> {
            self.check("LTRIM")?;
            if let Some(list) = self.lists.get_mut(key) {
                let len = list.len();
                let start = resolve(start, len).max(0) as usize;
                let stop = resolve(stop, len);
                if stop < 0 || start > stop as usize || start >= len {
                    list.clear();
                } else {
                    let stop = (stop as usize).min(len - 1);
                    let kept: VecDeque<String> = list.drain(start..=stop).collect();
                    *list = kept;
                }
                if list.is_empty() {
                    self.lists.remove(key);
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeLists;
    use super::*;

    fn store(limit: usize) -> RedisStore<FakeLists> {
        RedisStore::new(FakeLists::default(), "t:", limit).unwrap()
    }

    fn collect(store: &RedisStore<FakeLists>, ident: &str) -> Vec<f64> {
        store
            .samples(ident)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(
            RedisStore::new(FakeLists::default(), "", 0),
            Err(TimerError::Configuration(_))
        ));
    }

    #[test]
    fn append_pushes_then_trims_under_prefixed_key() {
        let s = store(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            s.append("job", v).unwrap();
        }
        let conn = s.conn.lock();
        assert_eq!(&conn.log[..2], &["LPUSH", "LTRIM"]);
        let list: Vec<_> = conn.lists["t:job"].iter().cloned().collect();
        assert_eq!(list, vec!["4", "3", "2"]);
    }

    #[test]
    fn largest_limit_keeps_every_sample() {
        let s = store(isize::MAX as usize);
        s.append("big", 1.0).unwrap();
        s.append("big", 2.0).unwrap();
        assert_eq!(s.len("big").unwrap(), 2);
        assert_eq!(s.conn.lock().log, vec!["LPUSH", "LTRIM", "LPUSH", "LTRIM", "LLEN"]);
    }

    #[test]
    fn iterates_newest_first() {
        let s = store(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            s.append("job", v).unwrap();
        }
        assert_eq!(s.len("job").unwrap(), 3);
        assert_eq!(collect(&s, "job"), vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn absent_key_behaves_as_empty() {
        let s = store(3);
        assert!(!s.contains("nope").unwrap());
        assert_eq!(s.len("nope").unwrap(), 0);
        assert!(collect(&s, "nope").is_empty());
    }

    #[test]
    fn round_trips_decimal_values() {
        let s = store(10);
        s.append("rt", 0.0025).unwrap();
        s.append("rt", 1e-9).unwrap();
        assert_eq!(collect(&s, "rt"), vec![1e-9, 0.0025]);
    }

    #[test]
    fn malformed_entry_fails_after_earlier_items() {
        let s = store(10);
        s.append("bad", 1.5).unwrap();
        {
            let mut conn = s.conn.lock();
            conn.lists.get_mut("t:bad").unwrap().push_back("oops".into());
        }
        let mut it = s.samples("bad").unwrap();
        assert_eq!(it.next().unwrap().unwrap(), 1.5);
        match it.next() {
            Some(Err(TimerError::Parse { key, value })) => {
                assert_eq!(key, "t:bad");
                assert_eq!(value, "oops");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn connection_failures_surface_as_connectivity() {
        let s = store(3);
        s.conn.lock().down = true;
        assert!(matches!(s.append("x", 1.0), Err(TimerError::Connectivity(_))));
        assert!(matches!(s.len("x"), Err(TimerError::Connectivity(_))));
        assert!(matches!(s.contains("x"), Err(TimerError::Connectivity(_))));
        assert!(matches!(s.samples("x"), Err(TimerError::Connectivity(_))));
    }
}
