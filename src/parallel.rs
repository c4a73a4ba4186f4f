//! Chromosome-parallel processing using Rayon.
//!
//! Inputs are validated and split into per-chromosome partitions. Each
//! partition is processed by a worker that owns all of its state; results
//! travel back over a bounded channel tagged with the partition's sequence
//! number and are handed to the sink strictly in genome order.

use std::collections::BTreeMap;

use crossbeam_channel::{bounded, Receiver};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::bed;
use crate::error::{IntersectError, Result, Stream};
use crate::genome::Genome;
use crate::interval::Record;
use crate::streaming::validation::SortValidator;

/// Records of one chromosome, from both inputs.
#[derive(Debug, Default)]
pub struct ChromPartition {
    /// Position of this partition in the output order
    pub seq_id: usize,
    /// Chromosome index in the genome ordering
    pub chrom_index: usize,
    pub a: Vec<Record>,
    pub b: Vec<Record>,
}

/// Both inputs split by chromosome.
#[derive(Debug, Default)]
pub struct PartitionedInput {
    /// Partitions for chromosomes that have "a" records, in genome order
    pub partitions: Vec<ChromPartition>,
    pub a_records: usize,
    pub b_records: usize,
}

/// Read and validate both inputs, grouping records by chromosome.
///
/// "b" records on chromosomes without any "a" record are validated and
/// counted, then dropped.
pub fn partition_by_chromosome<A, B>(a: A, b: B, genome: &Genome) -> Result<PartitionedInput>
where
    A: Iterator<Item = bed::Result<Record>>,
    B: Iterator<Item = bed::Result<Record>>,
{
    let mut input = PartitionedInput::default();

    let mut validator = SortValidator::new(Stream::A);
    for record in a {
        let record = record?;
        let chrom_index = validator.validate(&record.interval, genome)?;
        input.a_records += 1;

        match input.partitions.last_mut() {
            Some(part) if part.chrom_index == chrom_index => part.a.push(record),
            _ => {
                let seq_id = input.partitions.len();
                input.partitions.push(ChromPartition {
                    seq_id,
                    chrom_index,
                    a: vec![record],
                    b: Vec::new(),
                });
            }
        }
    }

    let slots: FxHashMap<usize, usize> = input
        .partitions
        .iter()
        .map(|p| (p.chrom_index, p.seq_id))
        .collect();

    let mut validator = SortValidator::new(Stream::B);
    for record in b {
        let record = record?;
        let chrom_index = validator.validate(&record.interval, genome)?;
        input.b_records += 1;

        if let Some(&slot) = slots.get(&chrom_index) {
            input.partitions[slot].b.push(record);
        }
    }

    Ok(input)
}

/// Process partitions on `threads` workers and feed results to `sink` in
/// partition order.
///
/// The first error, from a worker or from the sink, aborts the run; later
/// results are discarded.
pub fn run_ordered<T, F, S>(
    partitions: Vec<ChromPartition>,
    threads: usize,
    work: F,
    sink: S,
) -> Result<()>
where
    T: Send,
    F: Fn(ChromPartition) -> Result<T> + Sync,
    S: FnMut(T) -> Result<()>,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| IntersectError::ThreadPool(e.to_string()))?;

    let (result_tx, result_rx) = bounded::<(usize, Result<T>)>(threads.max(1) * 2);

    std::thread::scope(|scope| {
        let work = &work;
        scope.spawn(move || {
            pool.install(|| {
                partitions
                    .into_par_iter()
                    .for_each_with(result_tx, |tx, partition| {
                        let seq_id = partition.seq_id;
                        // The receiver is gone only after an error; nothing left to do.
                        let _ = tx.send((seq_id, work(partition)));
                    });
            });
        });

        merge_ordered(result_rx, sink)
    })
}

/// Hand results to `sink` in sequence order, buffering out-of-order ones.
///
/// Takes the receiver by value so that it is dropped on early return,
/// unblocking workers still sending.
fn merge_ordered<T, S>(result_rx: Receiver<(usize, Result<T>)>, mut sink: S) -> Result<()>
where
    S: FnMut(T) -> Result<()>,
{
    let mut pending: BTreeMap<usize, Result<T>> = BTreeMap::new();
    let mut next_expected = 0;

    for (seq_id, result) in result_rx.iter() {
        pending.insert(seq_id, result);

        while let Some(result) = pending.remove(&next_expected) {
            sink(result?)?;
            next_expected += 1;
        }
    }
    Ok(())
}
