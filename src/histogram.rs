//! Reuse-distance histogram with overflow handling (§4.6, component C6).
//!
//! A [`Histogram`] is the landing structure every engine writes into:
//! fixed-width bins for finite reuse distances, plus two scalar counters
//! (`infinity` for cold misses, `false_infinity` for finite distances that
//! overflowed the bin array under [`OutOfBoundsMode::AllowOverflow`]) and a
//! `running_sum` that must always equal their total. Every mutating method
//! keeps this in sync, and [`Histogram::validate`] checks it.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{EngineError, Result};

/// How [`Histogram::insert_finite`] (and its scaled variant) handle a
/// distance that falls past the last bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfBoundsMode {
    /// Count the overflow in `false_infinity` instead of any bin.
    AllowOverflow,
    /// Repeatedly pair adjacent bins and double `bin_size` until the
    /// distance fits, preserving all bins but losing resolution.
    MergeBins,
    /// Grow the bin array (doubling `num_bins`, zero-filling the new bins)
    /// until the distance fits. Preserves resolution; the default, per the
    /// design notes ("realloc... preserves precision").
    Realloc,
}

/// A fixed- or growing-bin histogram of reuse distances.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: Vec<u64>,
    bin_size: u64,
    false_infinity: u64,
    infinity: u64,
    running_sum: u64,
    mode: OutOfBoundsMode,
}

impl Histogram {
    /// Builds an empty histogram with `num_bins` bins of width `bin_size`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `num_bins` or `bin_size`
    /// is zero.
    pub fn new(num_bins: usize, bin_size: u64, mode: OutOfBoundsMode) -> Result<Self> {
        if num_bins == 0 {
            return Err(EngineError::invalid_config("histogram needs at least one bin"));
        }
        if bin_size == 0 {
            return Err(EngineError::invalid_config("histogram bin_size must be nonzero"));
        }
        Ok(Self {
            bins: vec![0; num_bins],
            bin_size,
            false_infinity: 0,
            infinity: 0,
            running_sum: 0,
            mode,
        })
    }

    /// Reconstructs a histogram from its raw parts, as read back from disk.
    /// Skips every insertion path and restores the counters verbatim, so
    /// callers are responsible for having validated them (e.g. via a prior
    /// [`Histogram::validate`] before the histogram was written out).
    #[must_use]
    pub fn from_parts(
        bins: Vec<u64>,
        bin_size: u64,
        false_infinity: u64,
        infinity: u64,
        running_sum: u64,
        mode: OutOfBoundsMode,
    ) -> Result<Self> {
        if bins.is_empty() {
            return Err(EngineError::invalid_config("histogram needs at least one bin"));
        }
        if bin_size == 0 {
            return Err(EngineError::invalid_config("histogram bin_size must be nonzero"));
        }
        Ok(Self {
            bins,
            bin_size,
            false_infinity,
            infinity,
            running_sum,
            mode,
        })
    }

    /// Number of bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Width of each bin.
    #[must_use]
    pub fn bin_size(&self) -> u64 {
        self.bin_size
    }

    /// Bin counts, in order.
    #[must_use]
    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    /// Finite reuse distances that overflowed under
    /// [`OutOfBoundsMode::AllowOverflow`].
    #[must_use]
    pub fn false_infinity(&self) -> u64 {
        self.false_infinity
    }

    /// Cold-miss (unbounded reuse distance) count.
    #[must_use]
    pub fn infinity(&self) -> u64 {
        self.infinity
    }

    /// Total accesses recorded, maintained as `infinity + false_infinity +
    /// sum(bins)`.
    #[must_use]
    pub fn running_sum(&self) -> u64 {
        self.running_sum
    }

    /// The configured overflow-handling mode.
    #[must_use]
    pub fn mode(&self) -> OutOfBoundsMode {
        self.mode
    }

    /// Records one occurrence of finite reuse distance `i`.
    pub fn insert_finite(&mut self, i: u64) {
        self.insert_scaled_finite(i, 1);
    }

    /// Records `scale` occurrences of finite reuse distance `i`.
    pub fn insert_scaled_finite(&mut self, i: u64, scale: u64) {
        let bin = self.resolve_bin(i);
        match bin {
            Some(bin) => self.bins[bin] += scale,
            None => self.false_infinity += scale,
        }
        self.running_sum += scale;
    }

    /// Records one cold miss.
    pub fn insert_infinite(&mut self) {
        self.insert_scaled_infinite(1);
    }

    /// Records `scale` cold misses.
    pub fn insert_scaled_infinite(&mut self, scale: u64) {
        self.infinity += scale;
        self.running_sum += scale;
    }

    /// Resolves `i` to a bin index, growing or coarsening the histogram
    /// per `self.mode` if `i` does not currently fit, or returning `None`
    /// under [`OutOfBoundsMode::AllowOverflow`] if it doesn't.
    fn resolve_bin(&mut self, i: u64) -> Option<usize> {
        let direct = (i / self.bin_size) as usize;
        if direct < self.bins.len() {
            return Some(direct);
        }
        match self.mode {
            OutOfBoundsMode::AllowOverflow => None,
            OutOfBoundsMode::MergeBins => {
                while (i / self.bin_size) as usize >= self.bins.len() {
                    self.merge_adjacent_bins();
                }
                Some((i / self.bin_size) as usize)
            }
            OutOfBoundsMode::Realloc => {
                while (i / self.bin_size) as usize >= self.bins.len() {
                    let new_len = self.bins.len() * 2;
                    self.bins.resize(new_len, 0);
                }
                Some((i / self.bin_size) as usize)
            }
        }
    }

    /// Pairs every two adjacent bins into one and doubles `bin_size`.
    fn merge_adjacent_bins(&mut self) {
        let merged: Vec<u64> = self
            .bins
            .chunks(2)
            .map(|pair| pair.iter().sum())
            .collect();
        self.bins = merged;
        self.bin_size *= 2;
    }

    /// Adds signed `delta` to the first bucket, borrowing into later
    /// buckets (zeroing each as it is exhausted) if `delta` is negative
    /// enough to underflow it. Clamping at zero can make the actual change
    /// smaller in magnitude than `delta`, so `running_sum` is adjusted by
    /// the net change actually applied to the bins, keeping it in sync.
    pub fn adjust_first_buckets(&mut self, delta: i64) {
        let mut remaining = delta;
        let mut net_change = 0i64;
        for bin in &mut self.bins {
            let current = *bin as i64;
            let new_val = current + remaining;
            if new_val >= 0 {
                net_change += new_val - current;
                *bin = new_val as u64;
                break;
            }
            net_change -= current;
            *bin = 0;
            remaining = new_val;
        }
        if net_change >= 0 {
            self.running_sum += net_change as u64;
        } else {
            self.running_sum -= (-net_change) as u64;
        }
    }

    /// Merges `other`'s counts into `self` bin-for-bin.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the two histograms have
    /// different shapes (`num_bins` or `bin_size`).
    pub fn iadd(&mut self, other: &Histogram) -> Result<()> {
        self.require_same_shape(other)?;
        for (a, b) in self.bins.iter_mut().zip(other.bins.iter()) {
            *a += *b;
        }
        self.false_infinity += other.false_infinity;
        self.infinity += other.infinity;
        self.running_sum += other.running_sum;
        Ok(())
    }

    /// Checks the running-sum invariant (spec §8 property 3).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvariantViolation`] if
    /// `running_sum != infinity + false_infinity + sum(bins)`.
    pub fn validate(&self) -> Result<()> {
        let bin_total: u64 = self.bins.iter().sum();
        let expected = self
            .infinity
            .checked_add(self.false_infinity)
            .and_then(|v| v.checked_add(bin_total));
        if expected == Some(self.running_sum) {
            Ok(())
        } else {
            Err(EngineError::invariant(
                "histogram running_sum does not match infinity + false_infinity + sum(bins)",
            ))
        }
    }

    /// Euclidean distance between `self` and `other`'s bin counts (plus the
    /// `infinity`/`false_infinity` counters, treated as two more bins).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the shapes differ.
    pub fn euclidean_error(&self, other: &Histogram) -> Result<f64> {
        self.require_same_shape(other)?;
        let mut sum_sq = 0.0f64;
        for (a, b) in self.bins.iter().zip(other.bins.iter()) {
            let diff = *a as f64 - *b as f64;
            sum_sq += diff * diff;
        }
        let inf_diff = self.infinity as f64 - other.infinity as f64;
        let finf_diff = self.false_infinity as f64 - other.false_infinity as f64;
        sum_sq += inf_diff * inf_diff + finf_diff * finf_diff;
        Ok(sum_sq.sqrt())
    }

    /// Mean absolute error per bin between `self` and `other` (also
    /// folding in `infinity`/`false_infinity` as two more bins).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the shapes differ.
    pub fn mean_absolute_error(&self, other: &Histogram) -> Result<f64> {
        self.require_same_shape(other)?;
        let mut sum_abs = 0.0f64;
        for (a, b) in self.bins.iter().zip(other.bins.iter()) {
            sum_abs += (*a as f64 - *b as f64).abs();
        }
        sum_abs += (self.infinity as f64 - other.infinity as f64).abs();
        sum_abs += (self.false_infinity as f64 - other.false_infinity as f64).abs();
        Ok(sum_abs / (self.bins.len() as f64 + 2.0))
    }

    fn require_same_shape(&self, other: &Histogram) -> Result<()> {
        if self.bins.len() != other.bins.len() || self.bin_size != other.bin_size {
            Err(EngineError::invalid_config(
                "histograms must share num_bins and bin_size to be compared",
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_insert_keeps_invariant() {
        let mut h = Histogram::new(10, 1, OutOfBoundsMode::Realloc).unwrap();
        h.insert_finite(0);
        h.insert_finite(3);
        h.insert_infinite();
        assert_eq!(h.bins()[0], 1);
        assert_eq!(h.bins()[3], 1);
        assert_eq!(h.infinity(), 1);
        assert_eq!(h.running_sum(), 3);
        h.validate().unwrap();
    }

    #[test]
    fn allow_overflow_routes_to_false_infinity() {
        let mut h = Histogram::new(4, 1, OutOfBoundsMode::AllowOverflow).unwrap();
        h.insert_finite(100);
        assert_eq!(h.false_infinity(), 1);
        assert_eq!(h.bins().iter().sum::<u64>(), 0);
        h.validate().unwrap();
    }

    #[test]
    fn merge_bins_doubles_bin_size_until_it_fits() {
        let mut h = Histogram::new(4, 1, OutOfBoundsMode::MergeBins).unwrap();
        for i in 0..4 {
            h.insert_finite(i);
        }
        h.insert_finite(10); // forces at least one merge
        assert!(h.bin_size() > 1);
        assert_eq!(h.num_bins(), 4);
        h.validate().unwrap();
    }

    #[test]
    fn realloc_grows_bin_count_until_it_fits() {
        let mut h = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        h.insert_finite(10);
        assert!(h.num_bins() > 4);
        assert_eq!(h.bin_size(), 1);
        h.validate().unwrap();
    }

    #[test]
    fn adjust_first_buckets_keeps_running_sum_invariant() {
        let mut h = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        h.insert_finite(0);
        h.insert_finite(0);
        h.insert_finite(1);
        h.adjust_first_buckets(-3);
        assert_eq!(h.bins()[0], 0);
        assert_eq!(h.bins()[1], 0);
        assert_eq!(h.running_sum(), 0);
        h.validate().unwrap();
    }

    #[test]
    fn adjust_first_buckets_grows_running_sum_on_positive_delta() {
        let mut h = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        h.insert_finite(0);
        h.adjust_first_buckets(5);
        assert_eq!(h.bins()[0], 6);
        assert_eq!(h.running_sum(), 6);
        h.validate().unwrap();
    }

    #[test]
    fn iadd_requires_matching_shape() {
        let mut a = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        let b = Histogram::new(8, 1, OutOfBoundsMode::Realloc).unwrap();
        assert!(a.iadd(&b).is_err());
    }

    #[test]
    fn iadd_merges_counts() {
        let mut a = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        let mut b = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        a.insert_finite(0);
        b.insert_finite(0);
        b.insert_infinite();
        a.iadd(&b).unwrap();
        assert_eq!(a.bins()[0], 2);
        assert_eq!(a.infinity(), 1);
        assert_eq!(a.running_sum(), 3);
    }

    #[test]
    fn identical_histograms_have_zero_error() {
        let mut a = Histogram::new(4, 1, OutOfBoundsMode::Realloc).unwrap();
        a.insert_finite(0);
        a.insert_infinite();
        let b = a.clone();
        assert_eq!(a.euclidean_error(&b).unwrap(), 0.0);
        assert_eq!(a.mean_absolute_error(&b).unwrap(), 0.0);
    }
}
