//! Bounded, hash-admitted key→value store (§4.5.a, component C4).
//!
//! [`EvictingSampledMap`] backs both the Evicting-Map engine
//! ([`crate::engine::evicting_map`], where `V = u64` timestamps) and
//! Evicting-QuickMRC ([`crate::engine::quickmrc`], where `V` is a QMRC
//! epoch). Both engines share the same bounded, hash-admitted slot table,
//! so this stays generic over the stored value to serve them both.
//!
//! Admission is hash-gated exactly like [`crate::hash::Sampler`], but the
//! threshold here is *not* fixed: once the `N`-slot array fills up, the
//! threshold is lowered to the maximum hash currently resident (a
//! "threshold refresh"), which can only shrink the admitted set further.
//! This gives [`EvictingSampledMap::threshold`] a non-increasing property.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::error::{EngineError, Result};
use crate::hash::splitmix64;

/// `2^64` as an `f64`, used to translate a threshold back into a ratio.
const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;

struct Slot<V> {
    key: u64,
    value: V,
    hash: u64,
}

/// Result of [`EvictingSampledMap::try_put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryPutOutcome<V> {
    /// The key's hash exceeded the threshold, or lost a collision: the map
    /// is unchanged.
    Ignored,
    /// The key occupied a previously empty slot.
    Inserted,
    /// The key displaced a different, hash-inferior resident of its slot.
    /// Carries that resident's old value (the caller treats it as an
    /// eviction, not an update).
    Replaced { old_value: V },
    /// The key was already resident in its slot; its value was overwritten.
    /// Carries the value it had before this call.
    Updated { old_value: V },
}

/// A fixed-capacity, hash-admitted map from `u64` keys to values of type
/// `V`, indexed by `hash(key) mod capacity`.
pub struct EvictingSampledMap<V> {
    slots: Vec<Option<Slot<V>>>,
    capacity: usize,
    occupied: usize,
    threshold: u64,
}

impl<V: Copy> EvictingSampledMap<V> {
    /// Builds a map with room for `capacity` resident keys.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(EngineError::invalid_config(
                "evicting map capacity must be at least 1",
            ));
        }
        Ok(Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
            occupied: 0,
            threshold: u64::MAX,
        })
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently occupied slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Current admission threshold `T`: a key is only ever considered if
    /// `hash(key) <= T`. Starts at `u64::MAX` (accept everything) and is
    /// lowered once the slot array first fills.
    #[must_use]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Estimated scale factor `1 / ratio_effective`, derived from the
    /// current threshold. Before the map has ever filled this is exactly
    /// `1.0` (no sampling bias has been introduced yet).
    #[must_use]
    pub fn scale_factor(&self) -> f64 {
        if self.threshold == u64::MAX {
            1.0
        } else {
            TWO_POW_64 / (self.threshold as f64 + 1.0)
        }
    }

    /// [`EvictingSampledMap::scale_factor`] rounded to the nearest `u64`
    /// (minimum 1), the form the histogram's scaled-insert operations take.
    #[must_use]
    pub fn scale(&self) -> u64 {
        (self.scale_factor().round() as u64).max(1)
    }

    /// Returns the value resident for `key`, without admitting or
    /// evicting anything. `Some` only if `key` currently occupies its
    /// slot; callers use this to decide, before calling
    /// [`EvictingSampledMap::try_put`], whether an access is a repeat of an
    /// already-resident key (which is guaranteed to come back `Updated`).
    #[must_use]
    pub fn peek(&self, key: u64) -> Option<V> {
        let hash = splitmix64(key);
        let idx = (hash % self.capacity as u64) as usize;
        match &self.slots[idx] {
            Some(slot) if slot.key == key => Some(slot.value),
            _ => None,
        }
    }

    /// Attempts to admit `key` with `value`, per the rules in §4.5.a:
    /// reject above threshold, claim an empty slot, update an exact match,
    /// or evict a hash-inferior resident.
    pub fn try_put(&mut self, key: u64, value: V) -> TryPutOutcome<V> {
        let hash = splitmix64(key);
        if hash > self.threshold {
            return TryPutOutcome::Ignored;
        }
        let idx = (hash % self.capacity as u64) as usize;
        match &mut self.slots[idx] {
            None => {
                self.slots[idx] = Some(Slot { key, value, hash });
                self.occupied += 1;
                if self.occupied == self.capacity {
                    self.refresh_threshold();
                }
                TryPutOutcome::Inserted
            }
            Some(slot) if slot.key == key => {
                let old_value = slot.value;
                slot.value = value;
                TryPutOutcome::Updated { old_value }
            }
            Some(slot) if slot.hash > hash => {
                let old_value = slot.value;
                *slot = Slot { key, value, hash };
                TryPutOutcome::Replaced { old_value }
            }
            Some(_) => TryPutOutcome::Ignored,
        }
    }

    /// Lowers `threshold` to the maximum hash currently resident.
    ///
    /// Called once, the instant the slot array first fills; every
    /// subsequent full slot array re-triggers it on the next eviction path,
    /// but since a `Replaced` resident's hash is always `<=` the displaced
    /// one, the maximum can only shrink or stay put; `threshold` is
    /// monotonically non-increasing (spec §8 property 5).
    fn refresh_threshold(&mut self) {
        let max_hash = self
            .slots
            .iter()
            .filter_map(|slot| slot.as_ref().map(|s| s.hash))
            .max();
        if let Some(max_hash) = max_hash {
            self.threshold = self.threshold.min(max_hash);
        }
    }
}
