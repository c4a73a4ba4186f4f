//! Minimal text VCF reader.
//!
//! Reads the fixed columns needed to place a variant (`CHROM`, `POS`, `REF`)
//! and the `INFO` column. Header lines are skipped; sample columns are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::bed::{BedError, Result};
use crate::extension::Value;
use crate::interval::{Interval, Record, TypedRecord, VcfPayload};
use crate::streaming::parsing::{parse_u64_fast, split_tabs};

const INFO_COLUMN: usize = 7;

/// A streaming VCF reader producing [`Record`]s with a VCF payload.
pub struct VcfReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
}

impl VcfReader<File> {
    /// Open a VCF file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> VcfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::with_capacity(256 * 1024, reader),
            line_number: 0,
            buffer: String::with_capacity(1024),
        }
    }

    /// Read the next variant.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = self.buffer.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return self.parse_line(line).map(Some);
        }
    }

    fn parse_line(&self, line: &str) -> Result<Record> {
        let fields: Vec<&[u8]> = split_tabs(line.as_bytes()).collect();
        if fields.len() <= INFO_COLUMN {
            return Err(BedError::Parse {
                line: self.line_number,
                message: format!(
                    "Expected at least {} VCF columns, got {}",
                    INFO_COLUMN + 1,
                    fields.len()
                ),
            });
        }

        let chrom = String::from_utf8_lossy(fields[0]);
        let pos = parse_u64_fast(fields[1])
            .filter(|&p| p > 0)
            .ok_or_else(|| BedError::Parse {
                line: self.line_number,
                message: format!("Invalid POS: '{}'", String::from_utf8_lossy(fields[1])),
            })?;
        let start = pos - 1;
        let stop = start + fields[3].len().max(1) as u64;

        let info = parse_info(&String::from_utf8_lossy(fields[INFO_COLUMN]));

        Ok(Record::with_payload(
            Interval::new(chrom, start, stop),
            TypedRecord::Vcf(VcfPayload { info }),
        ))
    }

    /// Get an iterator over all records.
    pub fn records(self) -> VcfRecordIter<R> {
        VcfRecordIter { reader: self }
    }
}

/// Iterator over VCF records.
pub struct VcfRecordIter<R: Read> {
    reader: VcfReader<R>,
}

impl<R: Read> Iterator for VcfRecordIter<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

/// Parse an INFO column (`KEY=VALUE;FLAG;KEY=V1,V2`).
pub fn parse_info(column: &str) -> FxHashMap<String, Value> {
    let mut info = FxHashMap::default();
    if column == "." {
        return info;
    }
    for entry in column.split(';').filter(|e| !e.is_empty()) {
        match entry.split_once('=') {
            Some((key, raw)) if raw.contains(',') => {
                let values = raw.split(',').map(parse_info_scalar).collect();
                info.insert(key.to_string(), Value::List(values));
            }
            Some((key, raw)) => {
                info.insert(key.to_string(), parse_info_scalar(raw));
            }
            None => {
                info.insert(entry.to_string(), Value::Bool(true));
            }
        }
    }
    info
}

fn parse_info_scalar(raw: &str) -> Value {
    if raw == "." {
        Value::Missing
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::Str(raw.to_string())
    }
}
