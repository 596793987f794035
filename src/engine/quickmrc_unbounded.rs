//! Unbounded QuickMRC engine (supplemental sibling of component C10).
//!
//! The distilled spec only names the bounded-memory
//! [`crate::engine::quickmrc::EvictingQuickMrc`], but the original project's
//! `quickmrc.c` also has a plain variant: every key ever seen is tracked
//! in an ordinary hash map (no sampling, no eviction), and only the
//! age-bucket ladder ([`crate::buckets::BucketLadder`]) approximates stack
//! distance. Useful as an intermediate point between Olken (exact, O(n)
//! memory) and Evicting-QuickMRC (bounded memory, sampled).

extern crate alloc;

use hashbrown::HashMap;

use crate::buckets::{BucketLadder, BucketLadderConfig};
use crate::engine::ReuseDistanceEngine;
use crate::error::Result;
use crate::histogram::{Histogram, OutOfBoundsMode};

/// Configuration for [`QuickMrc`].
#[derive(Debug, Clone, Copy)]
pub struct QuickMrcConfig {
    pub ladder: BucketLadderConfig,
    pub num_bins: usize,
    pub bin_size: u64,
    pub mode: OutOfBoundsMode,
}

/// Unbounded-memory approximate reuse-distance engine.
pub struct QuickMrc {
    epochs: HashMap<u64, i64>,
    ladder: BucketLadder,
    hist: Histogram,
}

impl QuickMrc {
    /// Builds a `QuickMrc` engine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::InvalidConfig`] if the ladder
    /// bucket count or the histogram shape is invalid.
    pub fn new(config: QuickMrcConfig) -> Result<Self> {
        Ok(Self {
            epochs: HashMap::new(),
            ladder: BucketLadder::new(config.ladder)?,
            hist: Histogram::new(config.num_bins, config.bin_size, config.mode)?,
        })
    }

    /// Number of distinct keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Whether no keys have been tracked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

impl ReuseDistanceEngine for QuickMrc {
    fn access(&mut self, key: u64) {
        match self.epochs.get(&key).copied() {
            Some(prior_epoch) => {
                let distance = self.ladder.lookup(prior_epoch);
                let fresh_epoch = self.ladder.insert();
                self.epochs.insert(key, fresh_epoch);
                self.hist.insert_finite(distance);
            }
            None => {
                let fresh_epoch = self.ladder.insert();
                self.epochs.insert(key, fresh_epoch);
                self.hist.insert_infinite();
            }
        }
    }

    fn post_process(&mut self) {}

    fn histogram(&self) -> &Histogram {
        &self.hist
    }
}
