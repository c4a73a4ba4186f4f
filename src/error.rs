//! Run-level error type.

use thiserror::Error;

use crate::bed::BedError;
use crate::config::ConfigError;
use crate::extension::ExtensionError;

/// Which input stream a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    A,
    B,
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stream::A => write!(f, "a"),
            Stream::B => write!(f, "b"),
        }
    }
}

/// Anything that aborts an intersect run.
#[derive(Error, Debug)]
pub enum IntersectError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("extension error: {0}")]
    Extension(#[from] ExtensionError),

    #[error("input error: {0}")]
    Input(#[from] BedError),

    #[error("invalid interval in {stream} input: {interval} (start must not exceed stop and chromosome must be non-empty)")]
    GeometryInvariantViolation { stream: Stream, interval: String },

    #[error("{stream} input is not sorted: {current} comes after {previous}")]
    Unsorted {
        stream: Stream,
        previous: String,
        current: String,
    },

    #[error("chromosome '{chrom}' in {stream} input is not in the genome file")]
    UnknownChromosome { stream: Stream, chrom: String },

    #[error("{interval} in {stream} input extends beyond the end of the chromosome ({length})")]
    BeyondChromosomeEnd {
        stream: Stream,
        interval: String,
        length: u64,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IntersectError>;
