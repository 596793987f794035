//! On-disk serialization for [`Histogram`] and [`MissRateCurve`]: packed
//! little-endian layouts, hand-rolled rather than via `serde` since both
//! formats are fixed headers plus a flat numeric array.
//!
//! Histogram layout: `num_bins: u64 | bin_size: u64 | false_infinity: u64 |
//! infinity: u64 | running_sum: u64 | bins: u64[num_bins]`.
//!
//! MRC layout: `num_bins: u64 | bin_size: u64 | miss_rate: f64[num_bins]`.
//! `miss_rate[k]` is the miss rate at cache size `k * bin_size`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use mrc_core::histogram::{Histogram, OutOfBoundsMode};
use mrc_core::mrc::MissRateCurve;

use crate::error::{Result, RunnerError};

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> RunnerError + '_ {
    move |source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `hist` to `path` in the packed histogram layout.
pub fn write_histogram(path: &Path, hist: &Histogram) -> Result<()> {
    let file = File::create(path).map_err(io_err(path))?;
    let mut w = BufWriter::new(file);
    w.write_all(&(hist.num_bins() as u64).to_le_bytes())
        .map_err(io_err(path))?;
    w.write_all(&hist.bin_size().to_le_bytes())
        .map_err(io_err(path))?;
    w.write_all(&hist.false_infinity().to_le_bytes())
        .map_err(io_err(path))?;
    w.write_all(&hist.infinity().to_le_bytes())
        .map_err(io_err(path))?;
    w.write_all(&hist.running_sum().to_le_bytes())
        .map_err(io_err(path))?;
    for bin in hist.bins() {
        w.write_all(&bin.to_le_bytes()).map_err(io_err(path))?;
    }
    w.flush().map_err(io_err(path))?;
    Ok(())
}

/// Reads a histogram back from `path`. The overflow mode is not persisted
/// on disk (it only governs mutation, not the stored shape), so callers
/// supply the mode the histogram should be reopened with.
pub fn read_histogram(path: &Path, mode: OutOfBoundsMode) -> Result<Histogram> {
    let file = File::open(path).map_err(io_err(path))?;
    let mut r = BufReader::new(file);
    let num_bins = read_u64(&mut r, path)? as usize;
    let bin_size = read_u64(&mut r, path)?;
    let false_infinity = read_u64(&mut r, path)?;
    let infinity = read_u64(&mut r, path)?;
    let running_sum = read_u64(&mut r, path)?;
    let mut bins = Vec::with_capacity(num_bins);
    for _ in 0..num_bins {
        bins.push(read_u64(&mut r, path)?);
    }
    Histogram::from_parts(bins, bin_size, false_infinity, infinity, running_sum, mode)
        .map_err(|source| RunnerError::Engine {
            algorithm: "histogram".to_string(),
            source,
        })
}

/// Writes `curve` to `path` in the packed MRC layout.
pub fn write_mrc(path: &Path, curve: &MissRateCurve) -> Result<()> {
    let file = File::create(path).map_err(io_err(path))?;
    let mut w = BufWriter::new(file);
    w.write_all(&(curve.len() as u64).to_le_bytes())
        .map_err(io_err(path))?;
    w.write_all(&curve.bin_size().to_le_bytes())
        .map_err(io_err(path))?;
    for rate in curve.miss_rate() {
        w.write_all(&rate.to_le_bytes()).map_err(io_err(path))?;
    }
    w.flush().map_err(io_err(path))?;
    Ok(())
}

/// Reads an MRC back from `path`.
pub fn read_mrc(path: &Path) -> Result<MissRateCurve> {
    let file = File::open(path).map_err(io_err(path))?;
    let mut r = BufReader::new(file);
    let num_bins = read_u64(&mut r, path)? as usize;
    let bin_size = read_u64(&mut r, path)?;
    let mut miss_rate = Vec::with_capacity(num_bins);
    for _ in 0..num_bins {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf).map_err(io_err(path))?;
        miss_rate.push(f64::from_le_bytes(buf));
    }
    Ok(MissRateCurve::from_parts(miss_rate, bin_size))
}

fn read_u64(r: &mut impl Read, path: &Path) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).map_err(io_err(path))?;
    Ok(u64::from_le_bytes(buf))
}
