//! Report assembly: part selection and row layout.
//!
//! A row is the "a" interval (or the selected part of it), followed by the
//! selected part of each "b" as `start\tstop`, followed by one column per
//! configured extension:
//!
//! ```text
//! chr1  0  10  3  7  odd  12
//! ^a-----------^b----^fields
//! ```
//!
//! | Part      | "a" rows                         | "b" columns              |
//! |-----------|----------------------------------|--------------------------|
//! | (none)    | one row, "a" whole               | "b" omitted              |
//! | `Whole`   | one row, "a" whole               | each "b" unchanged       |
//! | `Inverse` | one row per piece of a - union(b)| pieces of each b - a     |
//! | `Piece`   | one row per "b", carrying a ∩ b  | b ∩ a                    |

use std::fmt;

use crate::config::{IntersectionConfig, IntersectionPart};
use crate::extension::FieldValue;
use crate::fragment::Fragment;
use crate::interval::{Interval, Record};

/// One output line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub a: Interval,
    pub b: Vec<Interval>,
    pub fields: Vec<FieldValue>,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.a)?;
        for b in &self.b {
            write!(f, "\t{}\t{}", b.start, b.stop)?;
        }
        for field in &self.fields {
            write!(f, "\t{}", field)?;
        }
        Ok(())
    }
}

/// Turns fragments into report rows according to the configured parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssembler {
    a_part: Option<IntersectionPart>,
    b_part: Option<IntersectionPart>,
}

impl ReportAssembler {
    pub fn new(config: &IntersectionConfig) -> Self {
        Self {
            a_part: config.a_part(),
            b_part: config.b_part(),
        }
    }

    /// Rows for one fragment, in order. `fields` are the fragment's
    /// extension columns and are repeated on every row it produces.
    pub fn assemble(&self, fragment: &Fragment, fields: Vec<FieldValue>) -> Vec<ReportRow> {
        let a = &fragment.a.interval;
        match self.a_part {
            None | Some(IntersectionPart::Whole) => vec![ReportRow {
                a: a.clone(),
                b: self.b_columns(a, fragment.b.iter().map(|b| b.as_ref())),
                fields,
            }],
            Some(IntersectionPart::Inverse) => {
                let b_parts = self.b_columns(a, fragment.b.iter().map(|b| b.as_ref()));
                a.subtract_all(fragment.b.iter().map(|b| &b.interval))
                    .into_iter()
                    .map(|piece| ReportRow {
                        a: piece,
                        b: b_parts.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            }
            Some(IntersectionPart::Piece) => fragment
                .b
                .iter()
                .filter_map(|b| {
                    let piece = a.intersection(&b.interval)?;
                    Some(ReportRow {
                        a: piece,
                        b: self.b_columns(a, std::iter::once(b.as_ref())),
                        fields: fields.clone(),
                    })
                })
                .collect(),
        }
    }

    fn b_columns<'r, I>(&self, a: &Interval, bs: I) -> Vec<Interval>
    where
        I: Iterator<Item = &'r Record>,
    {
        match self.b_part {
            None => Vec::new(),
            Some(IntersectionPart::Whole) => bs.map(|b| b.interval.clone()).collect(),
            Some(IntersectionPart::Inverse) => bs.flat_map(|b| b.interval.subtract(a)).collect(),
            Some(IntersectionPart::Piece) => {
                bs.filter_map(|b| b.interval.intersection(a)).collect()
            }
        }
    }
}
