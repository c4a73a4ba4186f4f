//! Efficient output formatting for report rows.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use std::io::{BufWriter, Write};

use crate::bed::BedError;
use crate::extension::value::integral;
use crate::extension::{FieldValue, Scalar};
use crate::report::ReportRow;

/// Buffer size for RowWriter (8MB default).
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Buffered writer for tab-separated report rows.
pub struct RowWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> RowWriter<W> {
    /// Create a new RowWriter with default 8MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write one row followed by a newline.
    pub fn write_row(&mut self, row: &ReportRow) -> Result<(), BedError> {
        self.write_bytes(row.a.chrom.as_bytes())?;
        self.write_tab()?;
        self.write_int(row.a.start)?;
        self.write_tab()?;
        self.write_int(row.a.stop)?;

        for b in &row.b {
            self.write_tab()?;
            self.write_int(b.start)?;
            self.write_tab()?;
            self.write_int(b.stop)?;
        }

        for field in &row.fields {
            self.write_tab()?;
            self.write_field(field)?;
        }
        self.write_bytes(b"\n")
    }

    fn write_field(&mut self, field: &FieldValue) -> Result<(), BedError> {
        match field {
            FieldValue::Missing => self.write_bytes(b"."),
            FieldValue::Scalar(scalar) => self.write_scalar(scalar),
            FieldValue::List(values) if values.is_empty() => self.write_bytes(b"."),
            FieldValue::List(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b",")?;
                    }
                    match value {
                        Some(v) => self.write_float(*v)?,
                        None => self.write_bytes(b".")?,
                    }
                }
                Ok(())
            }
        }
    }

    fn write_scalar(&mut self, scalar: &Scalar) -> Result<(), BedError> {
        match scalar {
            Scalar::Str(s) => self.write_bytes(s.as_bytes()),
            Scalar::Int(i) => self.write_int(*i),
            Scalar::Float(f) => self.write_float(*f),
            Scalar::Bool(b) => self.write_bytes(if *b { b"1" } else { b"0" }),
        }
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), BedError> {
        self.writer
            .write_all(self.itoa_buf.format(n).as_bytes())
            .map_err(BedError::Io)
    }

    /// Write a float; integral values print without a fractional part.
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<(), BedError> {
        match integral(f) {
            Some(i) => self.write_int(i),
            None => self
                .writer
                .write_all(self.ryu_buf.format(f).as_bytes())
                .map_err(BedError::Io),
        }
    }

    #[inline]
    fn write_tab(&mut self) -> Result<(), BedError> {
        self.write_bytes(b"\t")
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BedError> {
        self.writer.write_all(bytes).map_err(BedError::Io)
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), BedError> {
        self.writer.flush().map_err(BedError::Io)
    }
}
