//! Command implementations for fragmap.

pub mod intersect;
pub mod map;

pub use intersect::{
    open_merged, open_records, FragmentReporter, IntersectCommand, IntersectStats, RecordStream,
};
pub use map::MapCommand;
