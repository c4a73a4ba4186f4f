// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

//! fragmap: sweep-line overlap of sorted genomic intervals with pluggable
//! per-fragment summaries.
//!
//! # Features
//!
//! - **Streaming sweep**: O(k) memory, where k is the largest set of "b"
//!   intervals active at once
//! - **Extensions**: classifiers, extractors and aggregators produce report
//!   columns for every fragment
//! - **Parallel processing**: chromosome partitions on a Rayon pool, merged
//!   back in genome order
//!
//! # Example
//!
//! ```rust,no_run
//! use fragmap::commands::IntersectCommand;
//! use fragmap::config::IntersectionConfig;
//! use fragmap::extension::{ExtensionCatalog, ExtensionSpec};
//! use fragmap::genome::Genome;
//!
//! let genome = Genome::from_file("hg38.genome").unwrap();
//! let spec: ExtensionSpec = "total:Float:sum:5:map:builtin".parse().unwrap();
//!
//! let cmd = IntersectCommand::new(IntersectionConfig::default())
//!     .with_extensions(&ExtensionCatalog::with_builtins(), &[spec])
//!     .unwrap();
//! cmd.run_files("a.bed", &["b.bed"], &genome, std::io::stdout()).unwrap();
//! ```

pub mod bed;
pub mod commands;
pub mod config;
pub mod error;
pub mod extension;
pub mod fragment;
pub mod genome;
pub mod interval;
pub mod parallel;
pub mod report;
pub mod streaming;
pub mod vcf;

// Re-export commonly used types
pub use bed::{read_records, BedReader};
pub use error::{IntersectError, Result};
pub use fragment::Fragment;
pub use interval::{Interval, Record, TypedRecord};
pub use vcf::VcfReader;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{read_records, BedReader};
    pub use crate::commands::{IntersectCommand, IntersectStats, MapCommand};
    pub use crate::config::{
        IntersectionConfig, IntersectionMode, IntersectionPart, OverlapAmount,
    };
    pub use crate::extension::{
        Aggregator, Classifier, ExtensionCatalog, ExtensionSpec, Extractor, Value,
    };
    pub use crate::fragment::Fragment;
    pub use crate::genome::Genome;
    pub use crate::interval::{Interval, Record, TypedRecord};
}
