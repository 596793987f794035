//! Uniform engine contract (§4.8, design notes "capability interface").
//!
//! Every reuse-distance engine is built from the same four components in
//! different combinations (see the module docs on each submodule) but
//! exposes the same three operations. The fourth operation in the source's
//! function-pointer table, `destroy`, has no member here: Rust's `Drop`
//! already runs when an engine goes out of scope, which is the idiomatic
//! reading of an explicit teardown slot in a vtable-style interface.
//!
//! Dispatch is static everywhere inside this crate (each engine is used as
//! its own concrete type); `mrc-runner` is where a `dyn ReuseDistanceEngine`
//! is needed, to hold a heterogeneous set of configured engines in one
//! `Vec`.

use crate::histogram::Histogram;

pub mod evicting_map;
pub mod fixed_rate_shards;
pub mod olken;
pub mod quickmrc;
pub mod quickmrc_unbounded;

/// The operations every reuse-distance engine supports.
pub trait ReuseDistanceEngine {
    /// Feeds one trace access through the engine, updating its internal
    /// state and (if the access is admitted) recording a reuse distance
    /// into its histogram.
    fn access(&mut self, key: u64);

    /// Runs any end-of-trace correction the engine needs (sampling-bias
    /// adjustment, for engines that sample). A no-op for engines that
    /// don't need one.
    fn post_process(&mut self);

    /// Read-only access to the engine's accumulated histogram.
    fn histogram(&self) -> &Histogram;
}
