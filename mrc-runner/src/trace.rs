//! Trace ingestion: memory-maps a trace file and iterates fixed-width
//! binary records out of it.
//!
//! Two on-disk record layouts are supported (little-endian, packed):
//!
//! - [`Format::TimestampMsCommand`] (25 bytes): `timestamp_ms: u64 |
//!   command: u8 (0=get,1=set) | key: u64 | size: u32 | ttl_s: u32`. Only
//!   `command == 0` records reach the engines.
//! - [`Format::TimestampSEviction`] (20 bytes): `timestamp_s: u32 | key: u64
//!   | size: u32 | eviction_time_s: u32`, all treated as reads.
//!
//! The mapping is opened read-only and shared across every engine thread,
//! matching the read-only, no-shared-mutable-state model.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{Result, RunnerError};

/// Which binary layout a trace file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 25-byte records: `timestamp_ms | command | key | size | ttl_s`.
    TimestampMsCommand,
    /// 20-byte records: `timestamp_s | key | size | eviction_time_s`.
    TimestampSEviction,
}

impl Format {
    fn record_len(self) -> usize {
        match self {
            Format::TimestampMsCommand => 25,
            Format::TimestampSEviction => 20,
        }
    }
}

/// A single decoded trace record. Only `key` feeds the reuse-distance
/// engines; the remaining fields are retained for future extensions
/// (e.g. size- or TTL-aware policies) and for the `generate` round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub key: u64,
    pub size: u32,
    pub ttl_s: u32,
    pub timestamp: u64,
}

/// A read-only, memory-mapped trace file.
pub struct Trace {
    mmap: Mmap,
    format: Format,
    path: PathBuf,
}

impl Trace {
    /// Opens `path` and validates its length is a whole number of records of
    /// `format`.
    pub fn open(path: &Path, format: Format) -> Result<Self> {
        let file = File::open(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let record_len = format.record_len();
        if mmap.len() % record_len != 0 {
            return Err(RunnerError::MisalignedTrace {
                path: path.to_path_buf(),
                size: mmap.len() as u64,
                record_len,
            });
        }
        Ok(Self {
            mmap,
            format,
            path: path.to_path_buf(),
        })
    }

    /// Number of records in the trace.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len() / self.format.record_len()
    }

    /// Whether the trace holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// The path this trace was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Iterates `key`-only accesses in trace order, skipping `set`/write
    /// records in the [`Format::TimestampMsCommand`] layout. This is the
    /// sequence the reuse-distance engines actually consume.
    pub fn accesses(&self) -> impl Iterator<Item = u64> + '_ {
        self.records().map(|r| r.key)
    }

    /// Iterates every decoded record, including non-read commands.
    pub fn records(&self) -> impl Iterator<Item = TraceRecord> + '_ {
        let record_len = self.format.record_len();
        let format = self.format;
        self.mmap
            .chunks_exact(record_len)
            .filter_map(move |chunk| decode(format, chunk))
    }
}

fn decode(format: Format, chunk: &[u8]) -> Option<TraceRecord> {
    match format {
        Format::TimestampMsCommand => {
            let timestamp = u64::from_le_bytes(chunk[0..8].try_into().unwrap());
            let command = chunk[8];
            let key = u64::from_le_bytes(chunk[9..17].try_into().unwrap());
            let size = u32::from_le_bytes(chunk[17..21].try_into().unwrap());
            let ttl_s = u32::from_le_bytes(chunk[21..25].try_into().unwrap());
            if command != 0 {
                return None;
            }
            Some(TraceRecord {
                key,
                size,
                ttl_s,
                timestamp,
            })
        }
        Format::TimestampSEviction => {
            let timestamp_s = u32::from_le_bytes(chunk[0..4].try_into().unwrap());
            let key = u64::from_le_bytes(chunk[4..12].try_into().unwrap());
            let size = u32::from_le_bytes(chunk[12..16].try_into().unwrap());
            let eviction_time_s = u32::from_le_bytes(chunk[16..20].try_into().unwrap());
            let ttl_s = eviction_time_s.saturating_sub(timestamp_s);
            Some(TraceRecord {
                key,
                size,
                ttl_s,
                timestamp: u64::from(timestamp_s),
            })
        }
    }
}

/// Encodes `record` into `format`'s on-disk layout, the inverse of
/// [`decode`]. Used by the `generate` subcommand.
pub fn encode(format: Format, record: TraceRecord, out: &mut Vec<u8>) {
    match format {
        Format::TimestampMsCommand => {
            out.extend_from_slice(&record.timestamp.to_le_bytes());
            out.push(0); // get
            out.extend_from_slice(&record.key.to_le_bytes());
            out.extend_from_slice(&record.size.to_le_bytes());
            out.extend_from_slice(&record.ttl_s.to_le_bytes());
        }
        Format::TimestampSEviction => {
            out.extend_from_slice(&(record.timestamp as u32).to_le_bytes());
            out.extend_from_slice(&record.key.to_le_bytes());
            out.extend_from_slice(&record.size.to_le_bytes());
            let eviction = record.timestamp as u32 + record.ttl_s;
            out.extend_from_slice(&eviction.to_le_bytes());
        }
    }
}
