//! Engine configuration: parses `Algorithm(key=value,...)` strings from the
//! command line into a concrete [`mrc_core::engine::ReuseDistanceEngine`].
//!
//! The textual shape (`Name(k=v,k=v)`) mirrors the original runner's
//! argument grammar; everything after the name is a flat `key=value` list so
//! new engine parameters don't need new CLI flags.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use mrc_core::buckets::BucketLadderConfig;
use mrc_core::engine::evicting_map::{EvictingMapEngine, EvictingMapEngineConfig};
use mrc_core::engine::fixed_rate_shards::{FixedRateShards, FixedRateShardsConfig};
use mrc_core::engine::olken::{Olken, OlkenConfig};
use mrc_core::engine::quickmrc::{EvictingQuickMrc, EvictingQuickMrcConfig};
use mrc_core::engine::quickmrc_unbounded::{QuickMrc, QuickMrcConfig};
use mrc_core::engine::ReuseDistanceEngine;
use mrc_core::histogram::OutOfBoundsMode;

use crate::error::{Result, RunnerError};

const DEFAULT_NUM_BINS: usize = 4096;
const DEFAULT_BIN_SIZE: u64 = 1;

/// One `--engine` occurrence: which algorithm, its parameters, and where to
/// write its outputs.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub algorithm: String,
    pub hist_path: PathBuf,
    pub mrc_path: PathBuf,
    params: BTreeMap<String, String>,
}

impl EngineSpec {
    /// Parses `text` (the `Algorithm(k=v,...)` part of an `--engine` flag)
    /// together with the output paths derived from `--out-dir` and the
    /// engine's position in the list.
    pub fn parse(text: &str, hist_path: PathBuf, mrc_path: PathBuf) -> Result<Self> {
        let (algorithm, params) = split_call(text)?;
        Ok(Self {
            algorithm,
            hist_path,
            mrc_path,
            params,
        })
    }

    fn get<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.params.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|_| RunnerError::Config(format!("{key}={raw} is not valid"))),
            None => Ok(default),
        }
    }

    fn num_bins(&self) -> Result<usize> {
        self.get("bins", DEFAULT_NUM_BINS)
    }

    fn bin_size(&self) -> Result<u64> {
        self.get("bin_size", DEFAULT_BIN_SIZE)
    }

    fn mode(&self) -> Result<OutOfBoundsMode> {
        match self.params.get("mode").map(String::as_str) {
            None | Some("realloc") => Ok(OutOfBoundsMode::Realloc),
            Some("merge") => Ok(OutOfBoundsMode::MergeBins),
            Some("overflow") => Ok(OutOfBoundsMode::AllowOverflow),
            Some(other) => Err(RunnerError::Config(format!("unknown mode '{other}'"))),
        }
    }

    fn ladder(&self) -> Result<BucketLadderConfig> {
        let num_buckets: usize = self.get("buckets", 32)?;
        let mut ladder = BucketLadderConfig::new(num_buckets);
        ladder.max_keys = self.get("qmrc_size", u64::MAX)?;
        Ok(ladder)
    }

    /// Builds the engine this spec describes.
    pub fn build(&self) -> Result<Box<dyn ReuseDistanceEngine + Send>> {
        let num_bins = self.num_bins()?;
        let bin_size = self.bin_size()?;
        let mode = self.mode()?;

        let engine: Box<dyn ReuseDistanceEngine + Send> = match self.algorithm.as_str() {
            "olken" => Box::new(
                Olken::new(OlkenConfig {
                    num_bins,
                    bin_size,
                    mode,
                })
                .map_err(|e| self.wrap(e))?,
            ),
            "fixed_rate_shards" => {
                let ratio: f64 = self.get("ratio", 0.01)?;
                let adjust: bool = self.get("adjust", true)?;
                Box::new(
                    FixedRateShards::new(FixedRateShardsConfig {
                        ratio,
                        adjust,
                        num_bins,
                        bin_size,
                        mode,
                    })
                    .map_err(|e| self.wrap(e))?,
                )
            }
            "evicting_map" => {
                let capacity: usize = self.get("size", 8192)?;
                Box::new(
                    EvictingMapEngine::new(EvictingMapEngineConfig {
                        capacity,
                        num_bins,
                        bin_size,
                        mode,
                    })
                    .map_err(|e| self.wrap(e))?,
                )
            }
            "quickmrc" => Box::new(
                QuickMrc::new(QuickMrcConfig {
                    ladder: self.ladder()?,
                    num_bins,
                    bin_size,
                    mode,
                })
                .map_err(|e| self.wrap(e))?,
            ),
            "evicting_quickmrc" => {
                let ratio: f64 = self.get("ratio", 0.01)?;
                let capacity: usize = self.get("size", 8192)?;
                Box::new(
                    EvictingQuickMrc::new(EvictingQuickMrcConfig {
                        ratio,
                        capacity,
                        ladder: self.ladder()?,
                        num_bins,
                        bin_size,
                        mode,
                    })
                    .map_err(|e| self.wrap(e))?,
                )
            }
            other => {
                return Err(RunnerError::Config(format!("unknown algorithm '{other}'")));
            }
        };
        Ok(engine)
    }

    fn wrap(&self, source: mrc_core::EngineError) -> RunnerError {
        RunnerError::Engine {
            algorithm: self.algorithm.clone(),
            source,
        }
    }
}

/// Splits `Name(k=v,k=v)` into the name and a `key=value` map. A bare
/// `Name` with no parens is accepted with an empty parameter set.
fn split_call(text: &str) -> Result<(String, BTreeMap<String, String>)> {
    let text = text.trim();
    let Some(open) = text.find('(') else {
        return Ok((text.to_string(), BTreeMap::new()));
    };
    if !text.ends_with(')') {
        return Err(RunnerError::Config(format!(
            "unbalanced parentheses in '{text}'"
        )));
    }
    let name = text[..open].to_string();
    let body = &text[open + 1..text.len() - 1];
    let mut params = BTreeMap::new();
    for pair in body.split(',').filter(|s| !s.is_empty()) {
        let (k, v) = pair
            .split_once('=')
            .ok_or_else(|| RunnerError::Config(format!("expected key=value in '{pair}'")))?;
        params.insert(k.trim().to_string(), v.trim().to_string());
    }
    Ok((name, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let spec = EngineSpec::parse("olken", "h".into(), "m".into()).unwrap();
        assert_eq!(spec.algorithm, "olken");
        assert!(spec.params.is_empty());
    }

    #[test]
    fn parses_parameters() {
        let spec = EngineSpec::parse(
            "fixed_rate_shards(ratio=0.05,adjust=false)",
            "h".into(),
            "m".into(),
        )
        .unwrap();
        assert_eq!(spec.params.get("ratio").unwrap(), "0.05");
        assert_eq!(spec.params.get("adjust").unwrap(), "false");
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(EngineSpec::parse("olken(bins=8", "h".into(), "m".into()).is_err());
    }

    #[test]
    fn builds_each_known_algorithm() {
        for name in [
            "olken",
            "fixed_rate_shards",
            "evicting_map",
            "quickmrc",
            "evicting_quickmrc",
        ] {
            let spec = EngineSpec::parse(name, "h".into(), "m".into()).unwrap();
            spec.build().unwrap();
        }
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let spec = EngineSpec::parse("not_a_real_engine", "h".into(), "m".into()).unwrap();
        assert!(spec.build().is_err());
    }
}
