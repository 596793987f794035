//! Fixed-Rate SHARDS engine (§4.4, component C8).
//!
//! Olken applied only to a hash-sampled subset of keys
//! ([`crate::hash::Sampler`]), with every histogram contribution scaled by
//! `1 / ratio` to recover unsampled-equivalent counts, and an optional
//! end-of-trace bucket adjustment ([`crate::hash::Sampler::adjustment`])
//! that corrects for sampling noise in the first few bins.

use crate::engine::ReuseDistanceEngine;
use crate::error::Result;
use crate::hash::Sampler;
use crate::histogram::{Histogram, OutOfBoundsMode};
use crate::timestamp_map::TimestampMap;
use crate::tree::Tree;

/// Configuration for [`FixedRateShards`].
#[derive(Debug, Clone, Copy)]
pub struct FixedRateShardsConfig {
    pub ratio: f64,
    pub adjust: bool,
    pub num_bins: usize,
    pub bin_size: u64,
    pub mode: OutOfBoundsMode,
}

/// Rate-sampled approximate reuse-distance engine.
pub struct FixedRateShards {
    sampler: Sampler,
    tree: Tree,
    map: TimestampMap,
    hist: Histogram,
    ts: u64,
}

impl FixedRateShards {
    /// Builds a Fixed-Rate SHARDS engine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::InvalidConfig`] if `ratio` is
    /// outside `(0, 1]`, or the histogram shape is invalid.
    pub fn new(config: FixedRateShardsConfig) -> Result<Self> {
        Ok(Self {
            sampler: Sampler::new(config.ratio, config.adjust)?,
            tree: Tree::new(),
            map: TimestampMap::new(),
            hist: Histogram::new(config.num_bins, config.bin_size, config.mode)?,
            ts: 0,
        })
    }

    /// Read access to the underlying sampler, for reporting sampling
    /// statistics.
    #[must_use]
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}

impl ReuseDistanceEngine for FixedRateShards {
    fn access(&mut self, key: u64) {
        if !self.sampler.sample(key) {
            return;
        }
        let scale = self.sampler.scale();
        match self.map.get(key) {
            Some(previous_ts) => {
                let distance = self.tree.reverse_rank(previous_ts);
                self.tree
                    .remove(previous_ts)
                    .expect("previous timestamp is always resident in the tree");
                self.tree.insert(self.ts);
                self.map.put(key, self.ts);
                self.hist.insert_scaled_finite(distance, scale);
            }
            None => {
                self.map.put(key, self.ts);
                self.tree.insert(self.ts);
                self.hist.insert_scaled_infinite(scale);
            }
        }
        self.ts += 1;
    }

    fn post_process(&mut self) {
        if self.sampler.adjust_enabled() {
            let adjustment = self.sampler.adjustment();
            self.hist.adjust_first_buckets(adjustment);
        }
    }

    fn histogram(&self) -> &Histogram {
        &self.hist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_shards(ratio: f64, adjust: bool) -> FixedRateShards {
        FixedRateShards::new(FixedRateShardsConfig {
            ratio,
            adjust,
            num_bins: 64,
            bin_size: 1,
            mode: OutOfBoundsMode::Realloc,
        })
        .unwrap()
    }

    #[test]
    fn full_ratio_matches_olken_exactly() {
        use crate::engine::olken::{Olken, OlkenConfig};
        let trace: Vec<u64> = (0..500).map(|i| i % 23).collect();

        let mut olken = Olken::new(OlkenConfig {
            num_bins: 64,
            bin_size: 1,
            mode: OutOfBoundsMode::Realloc,
        })
        .unwrap();
        for &k in &trace {
            olken.access(k);
        }

        let mut shards = new_shards(1.0, false);
        for &k in &trace {
            shards.access(k);
        }

        assert_eq!(olken.histogram().bins(), shards.histogram().bins());
        assert_eq!(olken.histogram().infinity(), shards.histogram().infinity());
    }

    #[test]
    fn adjustment_keeps_histogram_valid() {
        let mut shards = new_shards(0.1, true);
        for k in 0..5000u64 {
            shards.access(k % 200);
        }
        shards.post_process();
        shards.histogram().validate().unwrap();
    }

    #[test]
    fn low_ratio_keeps_histogram_valid() {
        let mut shards = new_shards(0.01, false);
        for k in 0..20_000u64 {
            shards.access(k % 1000);
        }
        shards.histogram().validate().unwrap();
    }
}
