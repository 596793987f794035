//! Histogram → Miss Ratio Curve transform (component C11).
//!
//! [`MissRateCurve::from_histogram`] is the final stage every engine feeds
//! into: a running-sum over bin counts turned into a miss rate at each
//! cache size. Because `infinity` and `false_infinity` never contribute to
//! the cumulative-hits sum, both are automatically counted as a miss at
//! every cache size, and because bin counts are non-negative the resulting
//! curve is monotonically non-increasing by construction (spec §8
//! property 7).

extern crate alloc;

use alloc::vec::Vec;

use crate::error::{EngineError, Result};
use crate::histogram::Histogram;

/// A miss ratio curve: `miss_rate[k]` is the fraction of accesses that
/// would miss in an LRU cache holding `k * bin_size` items.
#[derive(Debug, Clone)]
pub struct MissRateCurve {
    miss_rate: Vec<f64>,
    bin_size: u64,
}

impl MissRateCurve {
    /// Runs the running-sum transform over `hist`.
    ///
    /// `miss_rate[k] = 1.0 - hits_within(k) / running_sum`, where
    /// `hits_within(k)` is the cumulative count over `hist.bins()[0..k]`,
    /// so `miss_rate[0]` is always `1.0` (no capacity, everything misses).
    /// If `hist.running_sum()` is zero the curve is all ones.
    #[must_use]
    pub fn from_histogram(hist: &Histogram) -> Self {
        let running_sum = hist.running_sum() as f64;
        let mut miss_rate = Vec::with_capacity(hist.num_bins());
        let mut cumulative_hits = 0u64;
        for &count in hist.bins() {
            let miss = if running_sum > 0.0 {
                1.0 - (cumulative_hits as f64 / running_sum)
            } else {
                1.0
            };
            miss_rate.push(miss);
            cumulative_hits += count;
        }
        Self {
            miss_rate,
            bin_size: hist.bin_size(),
        }
    }

    /// Reconstructs a curve from its raw samples, as read back from disk.
    #[must_use]
    pub fn from_parts(miss_rate: Vec<f64>, bin_size: u64) -> Self {
        Self { miss_rate, bin_size }
    }

    /// Width, in cache-size units, of one MRC sample step.
    #[must_use]
    pub fn bin_size(&self) -> u64 {
        self.bin_size
    }

    /// The miss rate values, indexed by cache size `k * bin_size`.
    #[must_use]
    pub fn miss_rate(&self) -> &[f64] {
        &self.miss_rate
    }

    /// Number of samples in the curve.
    #[must_use]
    pub fn len(&self) -> usize {
        self.miss_rate.len()
    }

    /// Whether the curve has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.miss_rate.is_empty()
    }

    fn require_same_shape(&self, other: &MissRateCurve) -> Result<()> {
        if self.miss_rate.len() != other.miss_rate.len() || self.bin_size != other.bin_size {
            Err(EngineError::invalid_config(
                "MRCs must share length and bin_size to be compared",
            ))
        } else {
            Ok(())
        }
    }

    /// Mean absolute error against `other` (spec §8 properties 4/8: used
    /// both for SHARDS-vs-Olken and QMRC-vs-Olken comparisons).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the curves' shapes differ.
    pub fn mean_absolute_error(&self, other: &MissRateCurve) -> Result<f64> {
        self.require_same_shape(other)?;
        if self.miss_rate.is_empty() {
            return Ok(0.0);
        }
        let sum: f64 = self
            .miss_rate
            .iter()
            .zip(other.miss_rate.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        Ok(sum / self.miss_rate.len() as f64)
    }

    /// Maximum absolute error against `other`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the curves' shapes differ.
    pub fn max_absolute_error(&self, other: &MissRateCurve) -> Result<f64> {
        self.require_same_shape(other)?;
        let max = self
            .miss_rate
            .iter()
            .zip(other.miss_rate.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f64, f64::max);
        Ok(max)
    }

    /// Whether the curve is monotonically non-increasing, within `eps` of
    /// tolerance for floating-point noise.
    #[must_use]
    pub fn is_monotone_non_increasing(&self, eps: f64) -> bool {
        self.miss_rate.windows(2).all(|w| w[1] <= w[0] + eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::OutOfBoundsMode;

    #[test]
    fn empty_histogram_gives_all_ones() {
        let hist = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        let mrc = MissRateCurve::from_histogram(&hist);
        assert!(mrc.miss_rate().iter().all(|&m| m == 1.0));
    }

    #[test]
    fn hammer_scenario_s1() {
        // trace = [0]*5: infinity=1, bins[0]=4.
        let mut hist = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        hist.insert_infinite();
        for _ in 0..4 {
            hist.insert_finite(0);
        }
        let mrc = MissRateCurve::from_histogram(&hist);
        assert_eq!(mrc.miss_rate()[0], 1.0);
        // size 1 (k=1): cumulative hits = bins[0] = 4, running_sum = 5.
        assert!((mrc.miss_rate()[1] - 0.2).abs() < 1e-9);
    }

    #[test]
    fn step_scenario_s2() {
        // trace = [i % 10 for i in 0..100]: 10 infinities, 90 hits at distance 9.
        let mut hist = Histogram::new(16, 1, OutOfBoundsMode::Realloc).unwrap();
        for _ in 0..10 {
            hist.insert_infinite();
        }
        for _ in 0..90 {
            hist.insert_finite(9);
        }
        let mrc = MissRateCurve::from_histogram(&hist);
        // size 10 (k=10): cumulative hits over bins[0..10) = 0 (all mass is in bin 9).
        // Wait: bin 9 is included once k > 9, i.e. k=10 includes bins[0..10).
        assert!((mrc.miss_rate()[10] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn monotone_non_increasing_for_nonnegative_bins() {
        let mut hist = Histogram::new(8, 1, OutOfBoundsMode::Realloc).unwrap();
        hist.insert_finite(0);
        hist.insert_finite(3);
        hist.insert_finite(3);
        hist.insert_infinite();
        let mrc = MissRateCurve::from_histogram(&hist);
        assert!(mrc.is_monotone_non_increasing(1e-12));
        assert_eq!(mrc.miss_rate()[0], 1.0);
    }

    #[test]
    fn mean_absolute_error_requires_matching_shape() {
        let a = MissRateCurve::from_histogram(&Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap());
        let b = MissRateCurve::from_histogram(&Histogram::new(8, 1, OutOfBoundsMode::Realloc).unwrap());
        assert!(a.mean_absolute_error(&b).is_err());
    }
}
