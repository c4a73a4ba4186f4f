//! Calling resolved extensions on fragments and validating what comes back.

use std::fmt;

use super::{
    Aggregator, ExtensionError, ExtensionFn, Extractor, FieldValue, ResolvedExtension, Scalar,
    Value,
};
use crate::fragment::Fragment;
use crate::interval::Record;

/// Counters gathered while invoking extensions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InvocationStats {
    /// Extractor calls made
    pub extractor_calls: usize,
    /// Extractor calls on a record with the wrong payload type
    pub record_type_mismatches: usize,
}

impl InvocationStats {
    pub fn merge(&mut self, other: &InvocationStats) {
        self.extractor_calls += other.extractor_calls;
        self.record_type_mismatches += other.record_type_mismatches;
    }
}

impl fmt::Display for InvocationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Extractor calls: {}, Record type mismatches: {}",
            self.extractor_calls, self.record_type_mismatches
        )
    }
}

impl ResolvedExtension {
    /// The report column this extension produces for `fragment`.
    pub fn evaluate(
        &self,
        fragment: &Fragment,
        stats: &mut InvocationStats,
    ) -> Result<FieldValue, ExtensionError> {
        match &self.function {
            ExtensionFn::Classifier(classifier) => {
                self.finish(classifier.classify(fragment), fragment)
            }
            ExtensionFn::Map {
                extractor,
                aggregator,
            } => self.aggregate(extractor.as_ref(), aggregator.as_ref(), fragment, stats),
            ExtensionFn::Extractor(extractor) => {
                let values = fragment
                    .b
                    .iter()
                    .map(|b| {
                        self.extract(extractor.as_ref(), b, stats)?
                            .map(|v| self.check_numeric(v, b))
                            .transpose()
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FieldValue::List(values))
            }
        }
    }

    fn aggregate(
        &self,
        extractor: &dyn Extractor,
        aggregator: &dyn Aggregator,
        fragment: &Fragment,
        stats: &mut InvocationStats,
    ) -> Result<FieldValue, ExtensionError> {
        let mut values = Vec::with_capacity(fragment.b.len());
        if aggregator.counts_records() {
            values.resize(fragment.b.len(), 1.0);
        } else {
            for b in &fragment.b {
                if let Some(v) = self.extract(extractor, b, stats)? {
                    values.push(v);
                }
            }
        }
        let result = if values.is_empty() {
            aggregator.on_empty()
        } else {
            aggregator.aggregate(&values)
        };
        self.finish(result, fragment)
    }

    /// One extractor call. A payload mismatch is absent data, not an error.
    fn extract(
        &self,
        extractor: &dyn Extractor,
        record: &Record,
        stats: &mut InvocationStats,
    ) -> Result<Option<f64>, ExtensionError> {
        stats.extractor_calls += 1;
        match extractor.extract(record) {
            Ok(value) => value
                .into_extracted()
                .map_err(|value| ExtensionError::ExtractorContractViolation {
                    field: self.spec.field.clone(),
                    value: value.to_string(),
                    interval: record.interval.region(),
                }),
            Err(_) => {
                stats.record_type_mismatches += 1;
                Ok(None)
            }
        }
    }

    /// Values listed by extractor columns must fit the declared numeric type.
    fn check_numeric(&self, value: f64, record: &Record) -> Result<f64, ExtensionError> {
        self.spec
            .result_type
            .coerce(Scalar::Float(value))
            .map(|_| value)
            .map_err(|bad| self.type_violation(bad.into(), record))
    }

    /// Narrow a classifier or aggregator result and check it against the
    /// declared result type. Missing passes through as `.`.
    fn finish(&self, value: Value, fragment: &Fragment) -> Result<FieldValue, ExtensionError> {
        let scalar = value
            .into_scalar()
            .map_err(|bad| self.type_violation(bad, &fragment.a))?;
        match scalar {
            None => Ok(FieldValue::Missing),
            Some(s) => self
                .spec
                .result_type
                .coerce(s)
                .map(FieldValue::Scalar)
                .map_err(|bad| self.type_violation(bad.into(), &fragment.a)),
        }
    }

    fn type_violation(&self, value: Value, record: &Record) -> ExtensionError {
        ExtensionError::ResultTypeViolation {
            field: self.spec.field.clone(),
            expected: self.spec.result_type,
            value: value.to_string(),
            interval: record.interval.region(),
        }
    }
}
