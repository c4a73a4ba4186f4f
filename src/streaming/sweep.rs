//! Streaming overlap sweep producing [`Fragment`]s.
//!
//! # Algorithm
//!
//! For sorted inputs A and B:
//! 1. Read records from A one at a time, validating each
//! 2. On a chromosome change, clear the window of active B records
//! 3. Expire window entries that end at or before A.start
//! 4. Pull B records while they start before A.stop on A's chromosome,
//!    adding those that end after A.start; B records on earlier chromosomes,
//!    or entirely behind A, are dropped
//! 5. Candidates are window entries overlapping A; a candidate qualifies when
//!    the shared bases satisfy both the A-side and the B-side requirement
//! 6. The intersection mode shapes (A, qualifying B) into fragments
//!
//! Both streams are read once. Memory is O(k) where k is the largest number
//! of B records spanning one position.
//!
//! The sweep stops at the first error: the error is yielded once and the
//! iterator is exhausted afterwards.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bed;
use crate::config::{IntersectionConfig, IntersectionMode};
use crate::error::{Result, Stream};
use crate::fragment::Fragment;
use crate::genome::Genome;
use crate::interval::Record;
use crate::streaming::active_set::ActiveSet;
use crate::streaming::validation::SortValidator;

/// Warning threshold for active window size (potential pathological case)
pub const ACTIVE_WINDOW_WARNING_THRESHOLD: usize = 100_000;

/// Counters from one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Number of A records read
    pub a_records: usize,
    /// Number of B records read
    pub b_records: usize,
    /// Number of fragments yielded
    pub fragments: usize,
    /// Maximum size of the active B window (memory high-water mark)
    pub max_active_b: usize,
}

impl SweepStats {
    pub fn merge(&mut self, other: &SweepStats) {
        self.a_records += other.a_records;
        self.b_records += other.b_records;
        self.fragments += other.fragments;
        self.max_active_b = self.max_active_b.max(other.max_active_b);
    }
}

impl fmt::Display for SweepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A records: {}, B records: {}, Fragments: {}, Max active B: {}",
            self.a_records, self.b_records, self.fragments, self.max_active_b
        )
    }
}

/// Lazily intersects two sorted record streams.
pub struct OverlapSweep<'g, A, B>
where
    A: Iterator<Item = bed::Result<Record>>,
    B: Iterator<Item = bed::Result<Record>>,
{
    a: A,
    b: B,
    genome: &'g Genome,
    config: IntersectionConfig,
    window: ActiveSet,
    a_validator: SortValidator,
    b_validator: SortValidator,
    current_chrom: Option<usize>,
    /// Next B record, already validated, with its chromosome index
    pending_b: Option<(usize, Arc<Record>)>,
    queue: VecDeque<Fragment>,
    stats: SweepStats,
    warn_large_window: bool,
    /// Set once any sweep sharing this flag has warned
    warned: Arc<AtomicBool>,
    done: bool,
}

impl<'g, A, B> OverlapSweep<'g, A, B>
where
    A: Iterator<Item = bed::Result<Record>>,
    B: Iterator<Item = bed::Result<Record>>,
{
    pub fn new(a: A, b: B, genome: &'g Genome, config: IntersectionConfig) -> Self {
        Self {
            a,
            b,
            genome,
            config,
            window: ActiveSet::new(),
            a_validator: SortValidator::new(Stream::A),
            b_validator: SortValidator::new(Stream::B),
            current_chrom: None,
            pending_b: None,
            queue: VecDeque::new(),
            stats: SweepStats::default(),
            warn_large_window: true,
            warned: Arc::new(AtomicBool::new(false)),
            done: false,
        }
    }

    /// Enable or disable the large-window warning on stderr.
    pub fn warn_large_window(mut self, warn: bool) -> Self {
        self.warn_large_window = warn;
        self
    }

    /// Share the "already warned" flag with other sweeps, so a run split
    /// across partitions warns at most once.
    pub fn share_warning(mut self, warned: Arc<AtomicBool>) -> Self {
        self.warned = warned;
        self
    }

    pub fn stats(&self) -> SweepStats {
        SweepStats {
            max_active_b: self.window.max_active(),
            ..self.stats
        }
    }

    /// Process the next A record. Returns false once A is exhausted.
    fn step(&mut self) -> Result<bool> {
        let a = match self.a.next() {
            Some(record) => record?,
            None => {
                self.drain_b()?;
                return Ok(false);
            }
        };
        self.stats.a_records += 1;
        let a_index = self.a_validator.validate(&a.interval, self.genome)?;

        if self.current_chrom != Some(a_index) {
            self.window.clear();
            self.current_chrom = Some(a_index);
        }
        self.window.expire_before(a.start());
        self.fill_window(a_index, &a)?;

        self.check_window_size(self.window.len());

        let config = &self.config;
        let qualifying: Vec<Arc<Record>> = self
            .window
            .overlapping(a.start(), a.stop())
            .filter(|b| config.qualifies(a.interval.overlap_bases(&b.interval), a.len(), b.len()))
            .cloned()
            .collect();

        self.shape(a, qualifying);
        Ok(true)
    }

    /// Warn on stderr the first time the window grows past the threshold.
    /// Returns true if this call printed the warning.
    fn check_window_size(&self, active_size: usize) -> bool {
        if !self.warn_large_window || active_size <= ACTIVE_WINDOW_WARNING_THRESHOLD {
            return false;
        }
        if self.warned.swap(true, Ordering::Relaxed) {
            return false;
        }
        eprintln!(
            "Warning: Large active window detected ({} intervals). Memory usage: O({})",
            active_size, active_size
        );
        true
    }

    /// Pull the next B record into `pending_b`. Returns false at end of input.
    fn pull_b(&mut self) -> Result<bool> {
        match self.b.next() {
            Some(record) => {
                let record = record?;
                self.stats.b_records += 1;
                let index = self.b_validator.validate(&record.interval, self.genome)?;
                self.pending_b = Some((index, Arc::new(record)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn fill_window(&mut self, a_index: usize, a: &Record) -> Result<()> {
        loop {
            if self.pending_b.is_none() && !self.pull_b()? {
                return Ok(());
            }
            let (b_index, b_start) = match &self.pending_b {
                Some((index, b)) => (*index, b.start()),
                None => return Ok(()),
            };

            if b_index < a_index {
                // B has not reached A's chromosome yet
                self.pending_b = None;
                continue;
            }
            if b_index > a_index || b_start >= a.stop() {
                return Ok(());
            }

            if let Some((_, b)) = self.pending_b.take() {
                if !b.is_empty() && b.stop() > a.start() {
                    self.window.push(b);
                }
            }
        }
    }

    /// Read what is left of B so every record is validated.
    fn drain_b(&mut self) -> Result<()> {
        self.pending_b = None;
        while self.pull_b()? {
            self.pending_b = None;
        }
        Ok(())
    }

    fn shape(&mut self, a: Record, qualifying: Vec<Arc<Record>>) {
        let before = self.queue.len();
        match self.config.mode() {
            IntersectionMode::Default => self.queue.push_back(Fragment::new(a, qualifying)),
            IntersectionMode::Not => {
                if qualifying.is_empty() {
                    self.queue.push_back(Fragment::alone(a));
                }
            }
            IntersectionMode::PerOverlap => {
                for b in qualifying {
                    self.queue.push_back(Fragment::new(a.clone(), vec![b]));
                }
            }
        }
        self.stats.fragments += self.queue.len() - before;
    }
}

impl<'g, A, B> Iterator for OverlapSweep<'g, A, B>
where
    A: Iterator<Item = bed::Result<Record>>,
    B: Iterator<Item = bed::Result<Record>>,
{
    type Item = Result<Fragment>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(fragment) = self.queue.pop_front() {
                return Some(Ok(fragment));
            }
            if self.done {
                return None;
            }
            match self.step() {
                Ok(true) => continue,
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    self.queue.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}
