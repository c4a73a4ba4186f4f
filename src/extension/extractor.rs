//! Built-in extractors.
//!
//! Each applies [`coerce_numeric`] to the raw field, so booleans, unparsable
//! text and empty lists come back as [`Value::Missing`].

use super::{coerce_numeric, Extractor, RecordTypeMismatch, Value};
use crate::interval::{PayloadKind, Record, TypedRecord};

fn expect_bed(record: &Record) -> Result<&crate::interval::BedPayload, RecordTypeMismatch> {
    match &record.payload {
        TypedRecord::Bed(payload) => Ok(payload),
        other => Err(RecordTypeMismatch {
            expected: PayloadKind::Bed,
            found: other.kind(),
        }),
    }
}

/// The BED score column (column 5).
#[derive(Debug, Clone, Copy, Default)]
pub struct BedScore;

impl Extractor for BedScore {
    fn extract(&self, record: &Record) -> Result<Value, RecordTypeMismatch> {
        Ok(Value::from(expect_bed(record)?.score))
    }
}

/// Any BED column from 4 onwards, by 1-based number.
#[derive(Debug, Clone, Copy)]
pub struct BedColumn {
    column: usize,
}

impl BedColumn {
    /// Returns `None` for columns 1-3, which are coordinates, not payload.
    pub fn new(column: usize) -> Option<Self> {
        (column >= 4).then_some(Self { column })
    }

    pub fn column(&self) -> usize {
        self.column
    }
}

impl Extractor for BedColumn {
    fn extract(&self, record: &Record) -> Result<Value, RecordTypeMismatch> {
        let payload = expect_bed(record)?;
        let raw = payload.column(self.column).map(Value::from);
        Ok(Value::from(raw.as_ref().and_then(coerce_numeric)))
    }
}

/// A VCF INFO field, by key.
#[derive(Debug, Clone)]
pub struct VcfInfo {
    key: String,
}

impl VcfInfo {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Extractor for VcfInfo {
    fn extract(&self, record: &Record) -> Result<Value, RecordTypeMismatch> {
        match &record.payload {
            TypedRecord::Vcf(payload) => Ok(Value::from(
                payload.info(&self.key).and_then(coerce_numeric),
            )),
            other => Err(RecordTypeMismatch {
                expected: PayloadKind::Vcf,
                found: other.kind(),
            }),
        }
    }
}
