//! Built-in aggregators.
//!
//! `count` of nothing is `0`; every other reduction of nothing is missing.

use super::{Aggregator, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl Aggregator for Count {
    fn aggregate(&self, values: &[f64]) -> Value {
        Value::from(values.len())
    }

    fn on_empty(&self) -> Value {
        Value::Int(0)
    }

    fn counts_records(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sum;

impl Aggregator for Sum {
    fn aggregate(&self, values: &[f64]) -> Value {
        Value::Float(values.iter().sum())
    }

    fn on_empty(&self) -> Value {
        Value::Missing
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Mean;

impl Aggregator for Mean {
    fn aggregate(&self, values: &[f64]) -> Value {
        Value::Float(values.iter().sum::<f64>() / values.len() as f64)
    }

    fn on_empty(&self) -> Value {
        Value::Missing
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Min;

impl Aggregator for Min {
    fn aggregate(&self, values: &[f64]) -> Value {
        Value::Float(values.iter().copied().fold(f64::INFINITY, f64::min))
    }

    fn on_empty(&self) -> Value {
        Value::Missing
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Max;

impl Aggregator for Max {
    fn aggregate(&self, values: &[f64]) -> Value {
        Value::Float(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    fn on_empty(&self) -> Value {
        Value::Missing
    }
}

/// Middle value; the mean of the two middle values for even lengths.
#[derive(Debug, Clone, Copy, Default)]
pub struct Median;

impl Aggregator for Median {
    fn aggregate(&self, values: &[f64]) -> Value {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Value::Float(median)
    }

    fn on_empty(&self) -> Value {
        Value::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(Count.on_empty(), Value::Int(0));
        assert_eq!(Sum.on_empty(), Value::Missing);
        assert_eq!(Mean.on_empty(), Value::Missing);
        assert_eq!(Min.on_empty(), Value::Missing);
        assert_eq!(Max.on_empty(), Value::Missing);
        assert_eq!(Median.on_empty(), Value::Missing);
    }

    #[test]
    fn test_only_count_counts_records() {
        assert!(Count.counts_records());
        assert!(!Sum.counts_records());
        assert!(!Median.counts_records());
    }

    #[test]
    fn test_reductions() {
        let values = [4.0, 1.0, 3.0, 10.0];
        assert_eq!(Count.aggregate(&values), Value::Int(4));
        assert_eq!(Sum.aggregate(&values), Value::Float(18.0));
        assert_eq!(Mean.aggregate(&values), Value::Float(4.5));
        assert_eq!(Min.aggregate(&values), Value::Float(1.0));
        assert_eq!(Max.aggregate(&values), Value::Float(10.0));
        assert_eq!(Median.aggregate(&values), Value::Float(3.5));
        assert_eq!(Median.aggregate(&[5.0, 1.0, 9.0]), Value::Float(5.0));
    }
}
