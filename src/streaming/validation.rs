//! Inline input validation for the sweep.
//!
//! Every record entering the sweep is checked once, as it is pulled:
//! 1. Geometry: non-empty chromosome and `start <= stop`
//! 2. The chromosome is in the genome file and the record fits inside it
//! 3. Sort order: chromosome index never decreases, and within a chromosome
//!    start never decreases
//!
//! Validation is per stream; "a" and "b" each get their own validator.

use crate::error::{IntersectError, Result, Stream};
use crate::genome::Genome;
use crate::interval::Interval;

/// Checks records of one stream against the genome and the previous record.
#[derive(Debug)]
pub struct SortValidator {
    stream: Stream,
    prev: Option<(usize, Interval)>,
    record_count: usize,
}

impl SortValidator {
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            prev: None,
            record_count: 0,
        }
    }

    /// Validate the next record of the stream.
    ///
    /// Returns the record's chromosome index in the genome ordering.
    pub fn validate(&mut self, interval: &Interval, genome: &Genome) -> Result<usize> {
        self.record_count += 1;

        if interval.chrom.is_empty() || interval.start > interval.stop {
            return Err(IntersectError::GeometryInvariantViolation {
                stream: self.stream,
                interval: format!("{}:{}-{}", interval.chrom, interval.start, interval.stop),
            });
        }

        let contig = genome
            .contig(&interval.chrom)
            .ok_or_else(|| IntersectError::UnknownChromosome {
                stream: self.stream,
                chrom: interval.chrom.clone(),
            })?;

        if let Some(length) = contig.length {
            if interval.stop > length {
                return Err(IntersectError::BeyondChromosomeEnd {
                    stream: self.stream,
                    interval: interval.region(),
                    length,
                });
            }
        }

        if let Some((prev_index, prev)) = &self.prev {
            let out_of_order = contig.index < *prev_index
                || (contig.index == *prev_index && interval.start < prev.start);
            if out_of_order {
                return Err(IntersectError::Unsorted {
                    stream: self.stream,
                    previous: prev.region(),
                    current: interval.region(),
                });
            }
        }

        self.prev = Some((contig.index, interval.clone()));
        Ok(contig.index)
    }

    /// Number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}
