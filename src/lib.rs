#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Modules
//!
//! - [`hash`]: hash-based sampling (`C1`)
//! - [`tree`]: order-statistic splay tree (`C2`)
//! - [`timestamp_map`]: exact key → last-access-time map (`C3`)
//! - [`evicting_map`]: bounded, hash-admitted key → value store (`C4`)
//! - [`buckets`]: age-bucket ladder for QuickMRC (`C5`)
//! - [`histogram`]: reuse-distance histogram (`C6`)
//! - [`engine`]: the four reuse-distance engines (`C7`–`C10`) behind a
//!   uniform [`engine::ReuseDistanceEngine`] contract
//! - [`mrc`]: histogram → miss ratio curve transform (`C11`)
//! - [`error`]: the core's error type
//!
//! # Example
//!
//! ```rust
//! use mrc_core::engine::olken::{Olken, OlkenConfig};
//! use mrc_core::engine::ReuseDistanceEngine;
//! use mrc_core::histogram::OutOfBoundsMode;
//! use mrc_core::mrc::MissRateCurve;
//!
//! let mut olken = Olken::new(OlkenConfig {
//!     num_bins: 16,
//!     bin_size: 1,
//!     mode: OutOfBoundsMode::Realloc,
//! })
//! .unwrap();
//!
//! for key in [0u64, 1, 0, 2, 0, 1] {
//!     olken.access(key);
//! }
//!
//! let curve = MissRateCurve::from_histogram(olken.histogram());
//! assert_eq!(curve.miss_rate()[0], 1.0);
//! ```

#![no_std]

extern crate alloc;

/// Hash-based sampling (`C1`): the SHARDS admission rule shared by the
/// rate-sampled and bounded-memory engines.
pub mod hash;

/// Order-statistic splay tree (`C2`): the order-statistic structure behind
/// exact and bounded-memory reuse-distance queries.
pub mod tree;

/// Exact key → last-access-time map (`C3`), used by the Olken and
/// Fixed-Rate SHARDS engines.
pub mod timestamp_map;

/// Bounded, hash-admitted key → value store (`C4`), used by the
/// Evicting-Map and Evicting-QuickMRC engines.
pub mod evicting_map;

/// Age-bucket ladder (`C5`), the approximate stack-distance structure
/// behind both QuickMRC engines.
pub mod buckets;

/// Reuse-distance histogram with overflow handling (`C6`), the common
/// landing structure every engine writes into.
pub mod histogram;

/// The four reuse-distance engines (`C7`–`C10`) behind a uniform
/// [`engine::ReuseDistanceEngine`] contract.
pub mod engine;

/// Histogram → miss ratio curve transform (`C11`).
pub mod mrc;

/// Error type for the core engines.
pub mod error;

pub use error::{EngineError, Result};
