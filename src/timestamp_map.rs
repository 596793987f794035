//! Exact key → last-access-time mapping (§4.3 dependency, component C3).
//!
//! A thin wrapper around [`hashbrown::HashMap`]. There is no interesting
//! algorithm here, only the contract the engines need: "what timestamp did
//! I last see this key at, and what was it before I overwrite it."

extern crate alloc;

use hashbrown::HashMap;

/// Maps keys to the timestamp of their most recent access.
#[derive(Debug, Default)]
pub struct TimestampMap {
    inner: HashMap<u64, u64>,
}

impl TimestampMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    /// The timestamp currently recorded for `key`, if any.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<u64> {
        self.inner.get(&key).copied()
    }

    /// Records `timestamp` for `key`, returning the previous timestamp if
    /// one existed.
    pub fn put(&mut self, key: u64, timestamp: u64) -> Option<u64> {
        self.inner.insert(key, timestamp)
    }

    /// Number of distinct keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_returns_previous_value() {
        let mut m = TimestampMap::new();
        assert_eq!(m.put(1, 100), None);
        assert_eq!(m.get(1), Some(100));
        assert_eq!(m.put(1, 200), Some(100));
        assert_eq!(m.get(1), Some(200));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn distinct_keys_are_independent() {
        let mut m = TimestampMap::new();
        m.put(1, 10);
        m.put(2, 20);
        assert_eq!(m.get(1), Some(10));
        assert_eq!(m.get(2), Some(20));
        assert_eq!(m.get(3), None);
        assert_eq!(m.len(), 2);
    }
}
