//! Synthetic trace generation: emits a `(key, timestamp)` access sequence
//! either uniformly or Zipfian-distributed, and writes it out in one of the
//! two binary trace layouts from [`crate::trace`].
//!
//! The Zipfian sampler is the rejection-inversion method (Hörmann &
//! Derflinger), the same approach used by YCSB's `ZipfianGenerator`: O(1)
//! per sample after an O(1) setup, unlike building a cumulative
//! distribution table over `num_keys`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::{Result, RunnerError};
use crate::trace::{self, Format, TraceRecord};

/// Parameters for a synthetic trace.
#[derive(Debug, Clone)]
pub struct TraceGeneratorConfig {
    /// Number of accesses to emit.
    pub length: u64,
    /// Number of distinct keys (the Zipfian/uniform domain).
    pub num_keys: u64,
    /// Zipf skew parameter (`alpha`). Ignored if `uniform` is set.
    pub skew: f64,
    /// Draw keys uniformly instead of Zipfian.
    pub uniform: bool,
    /// Binary layout to write.
    pub format: Format,
    pub min_size: u32,
    pub max_size: u32,
    pub min_ttl: u32,
    pub max_ttl: u32,
    pub output_path: PathBuf,
    /// RNG seed, for reproducible traces.
    pub seed: u64,
}

impl Default for TraceGeneratorConfig {
    fn default() -> Self {
        Self {
            length: 1 << 20,
            num_keys: 1 << 20,
            skew: 0.99,
            uniform: false,
            format: Format::TimestampMsCommand,
            min_size: 64,
            max_size: 65536,
            min_ttl: 0,
            max_ttl: 86400,
            output_path: PathBuf::from("trace.bin"),
            seed: 0,
        }
    }
}

/// Rejection-inversion sampler for a Zipf distribution over `{0, ...,
/// num_keys - 1}` with exponent `skew`.
struct ZipfianSampler {
    num_keys: f64,
    skew: f64,
    h_integral_x1: f64,
    h_integral_num_keys: f64,
    s: f64,
}

impl ZipfianSampler {
    fn new(num_keys: u64, skew: f64) -> Self {
        let n = num_keys as f64;
        let h_integral_x1 = Self::h_integral(1.5, skew) - 1.0;
        let h_integral_num_keys = Self::h_integral(n + 0.5, skew);
        Self {
            num_keys: n,
            skew,
            h_integral_x1,
            h_integral_num_keys,
            s: 2.0 - Self::h_integral_inv(Self::h_integral(2.5, skew) - Self::h(2.0, skew), skew),
        }
    }

    fn h_integral(x: f64, skew: f64) -> f64 {
        let log_x = x.ln();
        if (skew - 1.0).abs() < 1e-10 {
            log_x
        } else {
            (x.powf(1.0 - skew) - 1.0) / (1.0 - skew)
        }
    }

    fn h_integral_inv(x: f64, skew: f64) -> f64 {
        if (skew - 1.0).abs() < 1e-10 {
            x.exp()
        } else {
            (1.0 - skew).mul_add(x, 1.0).max(0.0).powf(1.0 / (1.0 - skew))
        }
    }

    fn h(x: f64, skew: f64) -> f64 {
        x.powf(-skew)
    }

    fn sample(&self, rng: &mut impl Rng) -> u64 {
        loop {
            let u: f64 = self.h_integral_num_keys
                + rng.gen::<f64>() * (self.h_integral_x1 - self.h_integral_num_keys);
            let x = Self::h_integral_inv(u, self.skew);
            let k = (x + 0.5).floor().clamp(1.0, self.num_keys) as u64;
            let k_f = k as f64;
            if k_f - x <= self.s
                || u >= Self::h_integral(k_f + 0.5, self.skew) - Self::h(k_f, self.skew)
            {
                return k - 1;
            }
        }
    }
}

/// Generates synthetic traces according to a [`TraceGeneratorConfig`].
pub struct TraceGenerator {
    config: TraceGeneratorConfig,
}

impl TraceGenerator {
    #[must_use]
    pub fn new(config: TraceGeneratorConfig) -> Self {
        Self { config }
    }

    /// Writes `config.length` accesses to `config.output_path`.
    pub fn generate(&self) -> Result<()> {
        let path = &self.config.output_path;
        info!(
            length = self.config.length,
            num_keys = self.config.num_keys,
            skew = self.config.skew,
            uniform = self.config.uniform,
            path = %path.display(),
            "generating synthetic trace"
        );

        let file = File::create(path).map_err(|source| RunnerError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let zipf = (!self.config.uniform)
            .then(|| ZipfianSampler::new(self.config.num_keys, self.config.skew));

        let size_span = self.config.max_size.saturating_sub(self.config.min_size);
        let ttl_span = self.config.max_ttl.saturating_sub(self.config.min_ttl);
        let mut buf = Vec::new();
        for timestamp in 0..self.config.length {
            let key = match &zipf {
                Some(z) => z.sample(&mut rng),
                None => rng.gen_range(0..self.config.num_keys),
            };
            let record = TraceRecord {
                key,
                size: self.config.min_size + (size_span > 0).then(|| rng.gen_range(0..=size_span)).unwrap_or(0),
                ttl_s: self.config.min_ttl + (ttl_span > 0).then(|| rng.gen_range(0..=ttl_span)).unwrap_or(0),
                timestamp,
            };
            buf.clear();
            trace::encode(self.config.format, record, &mut buf);
            writer.write_all(&buf).map_err(|source| RunnerError::Io {
                path: path.clone(),
                source,
            })?;
        }
        writer.flush().map_err(|source| RunnerError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "trace generation complete");
        Ok(())
    }
}

/// Parses a `--format` CLI value into a [`Format`].
pub fn parse_format(s: &str) -> std::result::Result<Format, String> {
    match s {
        "ms-command" => Ok(Format::TimestampMsCommand),
        "s-eviction" => Ok(Format::TimestampSEviction),
        other => Err(format!(
            "unknown trace format '{other}' (expected ms-command or s-eviction)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zipfian_sampler_stays_in_range() {
        let sampler = ZipfianSampler::new(1000, 0.99);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let k = sampler.sample(&mut rng);
            assert!(k < 1000);
        }
    }

    #[test]
    fn zipfian_sampler_favors_low_ranks() {
        let sampler = ZipfianSampler::new(1000, 0.99);
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0u64; 1000];
        for _ in 0..50_000 {
            counts[sampler.sample(&mut rng) as usize] += 1;
        }
        assert!(counts[0] > counts[500]);
        assert!(counts[0] > counts[999]);
    }

    #[test]
    fn generate_writes_requested_record_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.bin");
        let config = TraceGeneratorConfig {
            length: 128,
            num_keys: 16,
            output_path: path.clone(),
            format: Format::TimestampSEviction,
            ..Default::default()
        };
        TraceGenerator::new(config).generate().unwrap();
        let trace = trace::Trace::open(&path, Format::TimestampSEviction).unwrap();
        assert_eq!(trace.len(), 128);
    }

    #[test]
    fn uniform_mode_covers_full_key_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.bin");
        let config = TraceGeneratorConfig {
            length: 5000,
            num_keys: 32,
            uniform: true,
            output_path: path.clone(),
            format: Format::TimestampSEviction,
            ..Default::default()
        };
        TraceGenerator::new(config).generate().unwrap();
        let trace = trace::Trace::open(&path, Format::TimestampSEviction).unwrap();
        let distinct: std::collections::HashSet<u64> = trace.accesses().collect();
        assert_eq!(distinct.len(), 32);
    }

    #[test]
    fn parse_format_rejects_unknown() {
        assert!(parse_format("bogus").is_err());
    }
}
