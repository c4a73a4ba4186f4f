//! K-way merge of sorted record streams.
//!
//! Several "b" files are swept as one stream: a min-heap holds the head of
//! each input, keyed by genome position, and the smallest is yielded next.
//! Ties go to the earlier input. Each input must already be sorted; an
//! inversion inside one input survives the merge and is caught by the
//! sweep's validator downstream.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::bed;
use crate::genome::Genome;
use crate::interval::Record;

/// Heap entry: one buffered record and the input it came from.
struct HeapEntry {
    /// Chromosome rank in the genome; unknown chromosomes sort last
    rank: usize,
    start: u64,
    stop: u64,
    input: usize,
    record: Record,
}

impl HeapEntry {
    fn key(&self) -> (usize, u64, u64, usize) {
        (self.rank, self.start, self.stop, self.input)
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Merges sorted record streams into one stream in genome order.
pub struct MergedRecords<I>
where
    I: Iterator<Item = bed::Result<Record>>,
{
    inputs: Vec<I>,
    heap: BinaryHeap<HeapEntry>,
    genome: Genome,
    primed: bool,
}

impl<I> MergedRecords<I>
where
    I: Iterator<Item = bed::Result<Record>>,
{
    pub fn new(inputs: Vec<I>, genome: Genome) -> Self {
        let capacity = inputs.len();
        Self {
            inputs,
            heap: BinaryHeap::with_capacity(capacity),
            genome,
            primed: false,
        }
    }

    /// Buffer the next record of `input`, if it has one.
    fn pull(&mut self, input: usize) -> bed::Result<()> {
        if let Some(record) = self.inputs[input].next().transpose()? {
            self.heap.push(HeapEntry {
                rank: self.genome.index(record.chrom()).unwrap_or(usize::MAX),
                start: record.start(),
                stop: record.stop(),
                input,
                record,
            });
        }
        Ok(())
    }
}

impl<I> Iterator for MergedRecords<I>
where
    I: Iterator<Item = bed::Result<Record>>,
{
    type Item = bed::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.primed {
            self.primed = true;
            for input in 0..self.inputs.len() {
                if let Err(e) = self.pull(input) {
                    return Some(Err(e));
                }
            }
        }

        let entry = self.heap.pop()?;
        if let Err(e) = self.pull(entry.input) {
            return Some(Err(e));
        }
        Some(Ok(entry.record))
    }
}
