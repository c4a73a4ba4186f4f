//! Fragments: one "a" record with its qualifying "b" overlaps.

use std::sync::Arc;

use crate::interval::Record;

/// One "a" record and the "b" records that survived the overlap filter.
///
/// "b" records are shared with the sweep window, which is why they are held
/// behind `Arc`. A fragment is never modified once the sweep yields it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub a: Record,
    pub b: Vec<Arc<Record>>,
}

impl Fragment {
    pub fn new(a: Record, b: Vec<Arc<Record>>) -> Self {
        Self { a, b }
    }

    /// A fragment with no "b" overlaps.
    pub fn alone(a: Record) -> Self {
        Self { a, b: Vec::new() }
    }

    #[inline]
    pub fn has_overlaps(&self) -> bool {
        !self.b.is_empty()
    }
}
