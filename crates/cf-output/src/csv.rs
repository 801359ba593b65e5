//! CSV output backend.
//!
//! One file, one header row, one record per emitted message.  The field
//! separator is configurable (`;` by default in the application).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::row::COLUMNS;
use crate::writer::OutputWriter;
use crate::{EventRow, OutputError, OutputResult};

/// Writes the event log as delimited text.
pub struct CsvWriter<W: Write = File> {
    inner:    Writer<W>,
    rows:     u64,
    finished: bool,
}

impl CsvWriter<File> {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: &Path, delimiter: u8) -> OutputResult<Self> {
        let inner = WriterBuilder::new().delimiter(delimiter).from_path(path)?;
        Self::with_header(inner)
    }
}

impl<W: Write> CsvWriter<W> {
    /// Write into any `Write` sink (a `Vec<u8>` in tests).
    pub fn from_writer(sink: W, delimiter: u8) -> OutputResult<Self> {
        Self::with_header(WriterBuilder::new().delimiter(delimiter).from_writer(sink))
    }

    fn with_header(mut inner: Writer<W>) -> OutputResult<Self> {
        inner.write_record(COLUMNS)?;
        Ok(Self { inner, rows: 0, finished: false })
    }

    /// Data rows written so far (the header is not counted).
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(self) -> OutputResult<W> {
        self.inner.into_inner().map_err(|e| OutputError::Io(e.into_error()))
    }
}

impl<W: Write> OutputWriter for CsvWriter<W> {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.inner.write_record(row.fields())?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.inner.flush()?;
        Ok(())
    }
}
