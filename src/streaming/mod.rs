//! Streaming machinery for the overlap sweep.
//!
//! - Zero-allocation line parsing shared by the readers
//! - Inline input validation
//! - The active "b" window
//! - K-way merge of several sorted "b" inputs
//! - The sweep itself
//! - Row output formatting
//!
//! The sweep keeps O(k) memory where k = max overlapping "b" records.

pub mod active_set;
pub mod merge;
pub mod output;
pub mod parsing;
pub mod sweep;
pub mod validation;

pub use active_set::ActiveSet;
pub use merge::MergedRecords;
pub use output::RowWriter;
pub use parsing::{parse_u64_fast, should_skip_line, split_tabs};
pub use sweep::{OverlapSweep, SweepStats, ACTIVE_WINDOW_WARNING_THRESHOLD};
pub use validation::SortValidator;
