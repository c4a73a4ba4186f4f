//! Streaming BED file parser.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use thiserror::Error;

use crate::interval::{BedPayload, Interval, Record, TypedRecord};
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, split_tabs};

/// Errors that can occur while reading BED, VCF, or genome files.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid BED format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, BedError>;

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl BedReader<File> {
    /// Open a BED file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, 256 * 1024)
    }

    /// Create a BED reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Read the next BED record.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_ascii_end();
            if should_skip_line(line) {
                continue;
            }

            return self.parse_line(line).map(Some);
        }
    }

    /// Parse a single BED line.
    fn parse_line(&self, line: &[u8]) -> Result<Record> {
        let line = std::str::from_utf8(line).map_err(|_| BedError::Parse {
            line: self.line_number,
            message: "line is not valid UTF-8".to_string(),
        })?;
        let mut fields = split_tabs(line.as_bytes());

        let chrom = fields.next().unwrap_or_default();
        let (Some(start), Some(stop)) = (fields.next(), fields.next()) else {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!(
                    "Expected at least 3 fields, got {}",
                    line.split('\t').count()
                ),
            });
        };

        if chrom.is_empty() {
            return Err(BedError::Parse {
                line: self.line_number,
                message: "Empty chromosome name".to_string(),
            });
        }
        let start = self.parse_position(start, "start")?;
        let stop = self.parse_position(stop, "end")?;

        if start > stop {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!("Start ({}) > end ({})", start, stop),
            });
        }

        let columns: Vec<String> = fields
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        let score = columns.get(1).and_then(|s| s.parse::<f64>().ok());

        Ok(Record::with_payload(
            Interval::new(String::from_utf8_lossy(chrom), start, stop),
            TypedRecord::Bed(BedPayload { score, columns }),
        ))
    }

    fn parse_position(&self, s: &[u8], field_name: &str) -> Result<u64> {
        parse_u64_fast(s).ok_or_else(|| BedError::Parse {
            line: self.line_number,
            message: format!(
                "Invalid {} position: '{}'",
                field_name,
                String::from_utf8_lossy(s)
            ),
        })
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedRecordIter<R> {
        BedRecordIter { reader: self }
    }
}

/// Iterator over BED records.
pub struct BedRecordIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedRecordIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Read all BED records from a file.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let reader = BedReader::from_path(path)?;
    reader.records().collect()
}

/// Parse records from a string (useful for testing).
pub fn parse_records(content: &str) -> Result<Vec<Record>> {
    BedReader::new(content.as_bytes()).records().collect()
}
