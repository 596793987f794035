//! Runner-level error type.
//!
//! Maps directly onto the four kinds spec'd for the whole system:
//! `ConfigError`, `IoError`, and `InvariantViolation`/`OutOfMemory` are
//! folded into [`RunnerError::Engine`] by wrapping
//! [`mrc_core::EngineError`]. `main` converts the top-level `Result` into
//! `anyhow::Result`, the way a CLI entry point reports failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the CLI runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// An engine configuration string was invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A trace or output file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A trace file's size was not a multiple of its record length.
    #[error("trace file {path} has size {size}, not a multiple of the {record_len}-byte record")]
    MisalignedTrace {
        path: PathBuf,
        size: u64,
        record_len: usize,
    },

    /// An engine failed during construction or while processing the
    /// trace.
    #[error("engine {algorithm} failed: {source}")]
    Engine {
        algorithm: String,
        #[source]
        source: mrc_core::EngineError,
    },
}

/// Result alias used throughout the runner.
pub type Result<T> = std::result::Result<T, RunnerError>;
