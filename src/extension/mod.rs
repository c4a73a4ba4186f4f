//! Extension points: classifiers, extractors and aggregators.
//!
//! Extensions are plain values implementing one of three traits. They are
//! looked up in an explicit [`ExtensionCatalog`] from a specification string
//! (see [`ExtensionSpec`]) and invoked synchronously by the intersect run.
//!
//! # Contract for extension authors
//!
//! - Every extension must be `Send + Sync`. Runs with `--threads > 1` call the
//!   same extension from several worker threads at once.
//! - Extensions must not keep global mutable state. Results must depend only
//!   on the arguments, so that parallel and sequential runs agree.
//! - Classifiers and extractors receive shared references and cannot modify
//!   the fragment or record they are handed.
//! - Aggregators must say what an empty input produces ([`Aggregator::on_empty`]).
//!   "No overlaps" is the common case, not an edge case.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::fragment::Fragment;
use crate::interval::{PayloadKind, Record};

pub mod aggregator;
pub mod catalog;
pub mod classifier;
pub mod extractor;
pub mod invoke;
pub mod spec;
pub mod value;

pub use catalog::{ExtensionCatalog, ExtensionFn, ResolvedExtension, BUILTIN_SOURCE};
pub use invoke::InvocationStats;
pub use spec::{expand_ops, ArgSlot, ExtensionKind, ExtensionSpec};
pub use value::{coerce_numeric, FieldValue, Scalar, ScalarType, Value};

/// Errors from parsing, resolving or invoking extensions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtensionError {
    #[error("invalid extension spec '{spec}': {reason}")]
    InvalidSpec { spec: String, reason: String },

    #[error("unknown result type '{0}' (expected Integer, Float, String, Flag)")]
    UnknownResultType(String),

    #[error("unknown extension kind '{0}' (expected classifier, map, extractor)")]
    UnknownKind(String),

    #[error("unknown extension source '{0}'")]
    UnknownSource(String),

    #[error("no {kind} named '{name}' in source '{source_name}'")]
    UnknownFunction {
        kind: &'static str,
        name: String,
        source_name: String,
    },

    #[error("extension '{field}': {reason}")]
    InvalidArgument { field: String, reason: String },

    #[error("invalid map columns: {0}")]
    InvalidMapColumns(String),

    #[error("extractor for '{field}' returned non-numeric value {value} for {interval}")]
    ExtractorContractViolation {
        field: String,
        value: String,
        interval: String,
    },

    #[error("extension '{field}' returned {value} for {interval}, which is not a valid {expected}")]
    ResultTypeViolation {
        field: String,
        expected: ScalarType,
        value: String,
        interval: String,
    },
}

/// An extractor was handed a record whose payload it cannot read.
///
/// Not fatal: the invocation layer turns it into a missing value and counts it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected {expected} record, found {found} record")]
pub struct RecordTypeMismatch {
    pub expected: PayloadKind,
    pub found: PayloadKind,
}

/// Labels a whole fragment.
pub trait Classifier: Send + Sync {
    fn classify(&self, fragment: &Fragment) -> Value;
}

/// Pulls one value out of a single record's payload.
///
/// Return [`Value::Missing`] when the field or payload is absent. Returning a
/// value that is not numeric is a contract violation and fails the run.
pub trait Extractor: Send + Sync {
    fn extract(&self, record: &Record) -> Result<Value, RecordTypeMismatch>;
}

/// Reduces the values extracted from a fragment's "b" records.
pub trait Aggregator: Send + Sync {
    /// Reduce a non-empty sequence.
    fn aggregate(&self, values: &[f64]) -> Value;

    /// Result when there are no values.
    fn on_empty(&self) -> Value;

    /// Whether every "b" record counts as one value, whether or not the
    /// extractor finds anything in it.
    fn counts_records(&self) -> bool {
        false
    }
}

/// A [`Classifier`] backed by a closure.
pub struct FnClassifier<F>(F);

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(&Fragment) -> Value + Send + Sync,
{
    fn classify(&self, fragment: &Fragment) -> Value {
        (self.0)(fragment)
    }
}

/// Wrap a closure as a shareable classifier.
pub fn classifier_fn<F>(f: F) -> Arc<dyn Classifier>
where
    F: Fn(&Fragment) -> Value + Send + Sync + 'static,
{
    Arc::new(FnClassifier(f))
}

/// An [`Extractor`] backed by a closure.
pub struct FnExtractor<F>(F);

impl<F> Extractor for FnExtractor<F>
where
    F: Fn(&Record) -> Result<Value, RecordTypeMismatch> + Send + Sync,
{
    fn extract(&self, record: &Record) -> Result<Value, RecordTypeMismatch> {
        (self.0)(record)
    }
}

/// Wrap a closure as a shareable extractor.
pub fn extractor_fn<F>(f: F) -> Arc<dyn Extractor>
where
    F: Fn(&Record) -> Result<Value, RecordTypeMismatch> + Send + Sync + 'static,
{
    Arc::new(FnExtractor(f))
}

/// An [`Aggregator`] backed by a closure and a fixed empty result.
pub struct FnAggregator<F> {
    f: F,
    empty: Value,
}

impl<F> Aggregator for FnAggregator<F>
where
    F: Fn(&[f64]) -> Value + Send + Sync,
{
    fn aggregate(&self, values: &[f64]) -> Value {
        (self.f)(values)
    }

    fn on_empty(&self) -> Value {
        self.empty.clone()
    }
}

/// Wrap a closure as a shareable aggregator. `empty` is returned for empty input.
pub fn aggregator_fn<F>(f: F, empty: Value) -> Arc<dyn Aggregator>
where
    F: Fn(&[f64]) -> Value + Send + Sync + 'static,
{
    Arc::new(FnAggregator { f, empty })
}

impl fmt::Debug for dyn Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Classifier")
    }
}

impl fmt::Debug for dyn Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Extractor")
    }
}

impl fmt::Debug for dyn Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Aggregator")
    }
}
