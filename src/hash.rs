//! Hash sampling (§4.1, component C1).
//!
//! A [`Sampler`] is a pure, stateful predicate over keys: `sample(key)`
//! answers whether the key is part of the sampled subset, by comparing a
//! fixed [`splitmix64`] hash of the key against a threshold derived from the
//! configured sampling ratio. This is the "Spatially Hashed Approximate
//! Reuse-Distance Sampling" (SHARDS) admission rule shared by the
//! [`crate::engine::fixed_rate_shards`] and [`crate::engine::quickmrc`]
//! engines, and by [`crate::evicting_map`]'s threshold refresh.
//!
//! # Threshold convention
//!
//! `T = floor(ratio · 2⁶⁴) − 1`, so `ratio = 1.0` accepts every key
//! (`T = u64::MAX`). This is one of two conventions the original project
//! used inconsistently; we fix this one end-to-end (see `SPEC_FULL.md`
//! Open Question 1).

use crate::error::{EngineError, Result};

/// `2^64` as an `f64`. Exactly representable (a power of two), so the
/// product below only loses precision from `ratio` itself, not from this
/// constant.
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

/// The fixed, reversible hash used everywhere a key needs to be mapped to a
/// uniformly distributed 64-bit value.
///
/// This is the splitmix64 finalizer (Steele, Lea & Flood), a bijection on
/// `u64`: every output has exactly one preimage, recoverable with
/// [`splitmix64_inverse`]. Reversibility is required so tests can construct
/// adversarial traces whose hash preimages are monotonically increasing or
/// decreasing (spec §8, scenario S6) without a forward search.
#[must_use]
pub fn splitmix64(key: u64) -> u64 {
    let mut z = key.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Inverse of [`splitmix64`]: recovers the key from its hash.
///
/// Only used by tests to construct adversarial traces; not on any hot path.
#[must_use]
pub fn splitmix64_inverse(hash: u64) -> u64 {
    let mut z = unshift_xor_right(hash, 31);
    z = z.wrapping_mul(modular_inverse_odd(0x94D0_49BB_1331_11EB));
    z = unshift_xor_right(z, 27);
    z = z.wrapping_mul(modular_inverse_odd(0xBF58_476D_1CE4_E5B9));
    z = unshift_xor_right(z, 30);
    z.wrapping_sub(0x9E37_79B9_7F4A_7C15)
}

/// Inverts `y = x ^ (x >> shift)` for `x`, given `y`.
///
/// `x ^ (x >> shift)` is a bijection on `u64` for any `shift`; recovering
/// `x` from `y` takes `ceil(64 / shift)` rounds of re-application.
fn unshift_xor_right(y: u64, shift: u32) -> u64 {
    let rounds = 64u32.div_ceil(shift);
    let mut x = y;
    for _ in 0..rounds {
        x = y ^ (x >> shift);
    }
    x
}

/// Multiplicative inverse of an odd `u64` modulo `2^64`, via Newton's
/// iteration (`x_{n+1} = x_n * (2 - a * x_n)`), which doubles the number of
/// correct low bits each round starting from 3 correct bits.
fn modular_inverse_odd(a: u64) -> u64 {
    let mut x = a;
    for _ in 0..6 {
        x = x.wrapping_mul(2u64.wrapping_sub(a.wrapping_mul(x)));
    }
    x
}

/// Running counts tracked by a [`Sampler`], exposed for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    /// Total keys offered to `sample`.
    pub seen: u64,
    /// Keys accepted (hash at or below the threshold).
    pub processed: u64,
}

/// Hash-based sampler: accepts key `k` iff `splitmix64(k) <= threshold`.
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    ratio: f64,
    threshold: u64,
    scale: u64,
    adjust: bool,
    stats: SamplerStats,
}

impl Sampler {
    /// Builds a sampler for the given ratio `r ∈ (0, 1]`.
    ///
    /// `adjust` controls whether [`Sampler::adjustment`] (used by the
    /// SHARDS-Adj bucket correction, §4.1) is meaningful; a sampler with
    /// `adjust = false` still computes the value but callers are expected
    /// to ignore it.
    pub fn new(ratio: f64, adjust: bool) -> Result<Self> {
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(EngineError::invalid_config(
                "sampling ratio must be in (0, 1]",
            ));
        }
        let scaled = (ratio * TWO_POW_64) as u128;
        let threshold = scaled.saturating_sub(1).min(u128::from(u64::MAX)) as u64;
        let scale = (1.0 / ratio).round() as u64;
        Ok(Self {
            ratio,
            threshold,
            scale: scale.max(1),
            adjust,
            stats: SamplerStats::default(),
        })
    }

    /// Tests and accounts for `key`, returning whether it was accepted.
    pub fn sample(&mut self, key: u64) -> bool {
        self.stats.seen += 1;
        let accepted = splitmix64(key) <= self.threshold;
        if accepted {
            self.stats.processed += 1;
        }
        accepted
    }

    /// The sampling threshold `T`.
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// The scale factor `1 / ratio` (rounded), used to inflate sampled
    /// histogram contributions back to unsampled-equivalent counts.
    #[must_use]
    pub fn scale(&self) -> u64 {
        self.scale
    }

    /// The configured sampling ratio.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Whether SHARDS-Adj bucket adjustment is enabled.
    #[must_use]
    pub fn adjust_enabled(&self) -> bool {
        self.adjust
    }

    /// Running `seen`/`processed` counters.
    #[must_use]
    pub fn stats(&self) -> SamplerStats {
        self.stats
    }

    /// The SHARDS-Adj correction: `scale * (seen * ratio - processed)`.
    ///
    /// Meant to be fed to
    /// [`crate::histogram::Histogram::adjust_first_buckets`], which keeps
    /// the histogram's running sum in sync with whatever change this
    /// correction actually makes to the bins.
    #[must_use]
    pub fn adjustment(&self) -> i64 {
        let expected = self.stats.seen as f64 * self.ratio;
        let delta = expected - self.stats.processed as f64;
        (delta * self.scale as f64).round() as i64
    }
}
