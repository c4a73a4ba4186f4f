//! Built-in classifiers.

use super::{Classifier, Value};
use crate::fragment::Fragment;

/// `"odd"` or `"even"` by the parity of the "a" start coordinate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartParity;

impl Classifier for StartParity {
    fn classify(&self, fragment: &Fragment) -> Value {
        let label = if fragment.a.start() % 2 == 1 { "odd" } else { "even" };
        Value::from(label)
    }
}

/// Number of "b" intervals in the fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapCount;

impl Classifier for OverlapCount {
    fn classify(&self, fragment: &Fragment) -> Value {
        Value::from(fragment.b.len())
    }
}

/// Total bases shared between "a" and each "b".
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapBases;

impl Classifier for OverlapBases {
    fn classify(&self, fragment: &Fragment) -> Value {
        let a = &fragment.a.interval;
        let total: u64 = fragment
            .b
            .iter()
            .map(|b| a.overlap_bases(&b.interval))
            .sum();
        Value::from(total)
    }
}

/// Total length of the "b" intervals.
#[derive(Debug, Clone, Copy, Default)]
pub struct BBases;

impl Classifier for BBases {
    fn classify(&self, fragment: &Fragment) -> Value {
        Value::from(fragment.b.iter().map(|b| b.len()).sum::<u64>())
    }
}
