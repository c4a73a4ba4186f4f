//! Contig order and length table.
//!
//! Parses `.genome` / `.fai` style files (tab-delimited: `chrom[\tlength...]`).
//! Only the first two columns are read; the length column is optional.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::bed::BedError;

/// One contig: its position in the ordering and its length, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contig {
    pub index: usize,
    pub length: Option<u64>,
}

/// Genome information: chromosome order and sizes.
/// Preserves chromosome order from input file.
#[derive(Debug, Clone, Default)]
pub struct Genome {
    contigs: FxHashMap<String, Contig>,
    order: Vec<String>,
}

impl Genome {
    /// Create an empty genome.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an ordering from chromosome names alone (no lengths).
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut genome = Self::new();
        for name in names {
            genome.push(name.into(), None);
        }
        genome
    }

    /// Load genome from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BedError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a genome table from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BedError> {
        let reader = BufReader::new(reader);
        let mut genome = Self::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let chrom = fields.next().unwrap_or_default();
            let length = match fields.next() {
                Some(size) => Some(size.trim().parse::<u64>().map_err(|_| BedError::Parse {
                    line: line_num + 1,
                    message: format!("Invalid chromosome size: {}", size),
                })?),
                None => None,
            };

            if genome.contigs.contains_key(chrom) {
                return Err(BedError::Parse {
                    line: line_num + 1,
                    message: format!("Duplicate chromosome in genome file: {}", chrom),
                });
            }
            genome.push(chrom.to_string(), length);
        }

        Ok(genome)
    }

    fn push(&mut self, chrom: String, length: Option<u64>) {
        if self.contigs.contains_key(&chrom) {
            return;
        }
        let index = self.order.len();
        self.order.push(chrom.clone());
        self.contigs.insert(chrom, Contig { index, length });
    }

    /// Look up a contig.
    #[inline]
    pub fn contig(&self, chrom: &str) -> Option<Contig> {
        self.contigs.get(chrom).copied()
    }

    /// Position of a chromosome in the ordering.
    #[inline]
    pub fn index(&self, chrom: &str) -> Option<usize> {
        self.contigs.get(chrom).map(|c| c.index)
    }

    /// Get the size of a chromosome.
    #[inline]
    pub fn chrom_size(&self, chrom: &str) -> Option<u64> {
        self.contigs.get(chrom).and_then(|c| c.length)
    }

    /// Get all chromosome names in order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Get number of chromosomes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
