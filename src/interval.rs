//! Core interval and record types.
//!
//! Coordinates are 0-based, half-open (BED convention). A [`Record`] pairs an
//! [`Interval`] with the typed payload that was parsed alongside it.

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::extension::Value;
use crate::genome::Genome;

/// A genomic interval with chromosome, start, and stop positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub stop: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, stop: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            stop,
        }
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    /// Returns true if the interval has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.stop
    }

    /// Check if this interval shares at least one base with another.
    ///
    /// Zero-length intervals never overlap anything.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.chrom == other.chrom
            && !self.is_empty()
            && !other.is_empty()
            && self.start < other.stop
            && other.start < self.stop
    }

    /// Number of bases shared with another interval.
    #[inline]
    pub fn overlap_bases(&self, other: &Interval) -> u64 {
        if !self.overlaps(other) {
            return 0;
        }
        self.stop.min(other.stop) - self.start.max(other.start)
    }

    /// The overlapping portion of two intervals, if any.
    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Interval {
            chrom: self.chrom.clone(),
            start: self.start.max(other.start),
            stop: self.stop.min(other.stop),
        })
    }

    /// Subtract another interval from this one, returning the remaining pieces.
    ///
    /// Yields zero pieces when `other` covers `self`, one when `other` clips
    /// an end, and two when `other` sits strictly inside `self`.
    pub fn subtract(&self, other: &Interval) -> Vec<Interval> {
        if !self.overlaps(other) {
            return if self.is_empty() {
                Vec::new()
            } else {
                vec![self.clone()]
            };
        }

        let mut result = Vec::with_capacity(2);

        if self.start < other.start {
            result.push(Interval {
                chrom: self.chrom.clone(),
                start: self.start,
                stop: other.start,
            });
        }

        if self.stop > other.stop {
            result.push(Interval {
                chrom: self.chrom.clone(),
                start: other.stop,
                stop: self.stop,
            });
        }

        result
    }

    /// Subtract every interval in `others` from this one.
    ///
    /// `others` need not be sorted or disjoint.
    pub fn subtract_all<'a, I>(&self, others: I) -> Vec<Interval>
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut pieces = if self.is_empty() {
            Vec::new()
        } else {
            vec![self.clone()]
        };
        for other in others {
            if pieces.is_empty() {
                break;
            }
            pieces = pieces.iter().flat_map(|p| p.subtract(other)).collect();
        }
        pieces
    }

    /// Compare by contig order, then start, then stop.
    ///
    /// Chromosomes missing from `genome` sort after known ones, by name.
    pub fn cmp_in(&self, other: &Interval, genome: &Genome) -> Ordering {
        let chrom_order = match (genome.index(&self.chrom), genome.index(&other.chrom)) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.chrom.cmp(&other.chrom),
        };
        chrom_order
            .then(self.start.cmp(&other.start))
            .then(self.stop.cmp(&other.stop))
    }

    /// Region string in 1-based inclusive notation, used in error messages.
    pub fn region(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.start + 1, self.stop)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.stop)
    }
}

/// Fields of a BED line beyond the first three.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BedPayload {
    /// Column 5 parsed as a number, when present and numeric.
    pub score: Option<f64>,
    /// Raw columns 4 and onwards, in file order.
    pub columns: Vec<String>,
}

impl BedPayload {
    /// The name column (column 4), if present.
    pub fn name(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    /// Raw text of a 1-based BED column numbered 4 or higher.
    pub fn column(&self, column: usize) -> Option<&str> {
        column
            .checked_sub(4)
            .and_then(|i| self.columns.get(i))
            .map(String::as_str)
    }
}

/// VCF INFO fields keyed by ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VcfPayload {
    pub info: FxHashMap<String, Value>,
}

impl VcfPayload {
    /// Look up an INFO field.
    pub fn info(&self, key: &str) -> Option<&Value> {
        self.info.get(key)
    }
}

/// Typed payload carried alongside an interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TypedRecord {
    Bed(BedPayload),
    Vcf(VcfPayload),
    #[default]
    None,
}

impl TypedRecord {
    /// Short name of the payload variant.
    pub fn kind(&self) -> PayloadKind {
        match self {
            TypedRecord::Bed(_) => PayloadKind::Bed,
            TypedRecord::Vcf(_) => PayloadKind::Vcf,
            TypedRecord::None => PayloadKind::None,
        }
    }
}

/// Discriminant of [`TypedRecord`], used in mismatch diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Bed,
    Vcf,
    None,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::Bed => write!(f, "BED"),
            PayloadKind::Vcf => write!(f, "VCF"),
            PayloadKind::None => write!(f, "no"),
        }
    }
}

/// An interval together with the record it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub interval: Interval,
    pub payload: TypedRecord,
}

impl Record {
    /// A record with no payload.
    pub fn new(chrom: impl Into<String>, start: u64, stop: u64) -> Self {
        Self {
            interval: Interval::new(chrom, start, stop),
            payload: TypedRecord::None,
        }
    }

    /// A record with the given payload.
    pub fn with_payload(interval: Interval, payload: TypedRecord) -> Self {
        Self { interval, payload }
    }

    #[inline]
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }

    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start
    }

    #[inline]
    pub fn stop(&self) -> u64 {
        self.interval.stop
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.interval.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }
}
