//! Olken's engine: exact reuse distance (§4.3, component C7).
//!
//! Combines [`crate::tree::Tree`] (C2) and [`crate::timestamp_map::TimestampMap`]
//! (C3) to compute the exact LRU stack distance on every access. This is
//! the reference implementation every approximate engine
//! ([`crate::engine::fixed_rate_shards`], [`crate::engine::evicting_map`],
//! [`crate::engine::quickmrc`]) is checked against (spec §8 property 1).

use crate::engine::ReuseDistanceEngine;
use crate::error::Result;
use crate::histogram::{Histogram, OutOfBoundsMode};
use crate::timestamp_map::TimestampMap;
use crate::tree::Tree;

/// Configuration for [`Olken`].
#[derive(Debug, Clone, Copy)]
pub struct OlkenConfig {
    pub num_bins: usize,
    pub bin_size: u64,
    pub mode: OutOfBoundsMode,
}

/// Exact reuse-distance engine.
pub struct Olken {
    tree: Tree,
    map: TimestampMap,
    hist: Histogram,
    ts: u64,
}

impl Olken {
    /// Builds an Olken engine with an empty histogram shaped per `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::InvalidConfig`] if the
    /// histogram shape is invalid (zero bins or zero bin size).
    pub fn new(config: OlkenConfig) -> Result<Self> {
        Ok(Self {
            tree: Tree::new(),
            map: TimestampMap::new(),
            hist: Histogram::new(config.num_bins, config.bin_size, config.mode)?,
            ts: 0,
        })
    }

    /// The current logical timestamp (number of accesses processed).
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.ts
    }
}

impl ReuseDistanceEngine for Olken {
    fn access(&mut self, key: u64) {
        match self.map.get(key) {
            Some(previous_ts) => {
                let distance = self.tree.reverse_rank(previous_ts);
                self.tree
                    .remove(previous_ts)
                    .expect("previous timestamp is always resident in the tree");
                self.tree.insert(self.ts);
                self.map.put(key, self.ts);
                self.hist.insert_finite(distance);
            }
            None => {
                self.map.put(key, self.ts);
                self.tree.insert(self.ts);
                self.hist.insert_infinite();
            }
        }
        self.ts += 1;
    }

    fn post_process(&mut self) {}

    fn histogram(&self) -> &Histogram {
        &self.hist
    }
}
