//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EventRow, OutputResult};

/// Append-only sink for [`EventRow`]s.
///
/// Errors are returned to the caller; [`EventLogObserver`][crate::EventLogObserver]
/// stores the first one since observer callbacks cannot fail.
pub trait OutputWriter {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Flush everything to the underlying storage.
    ///
    /// Idempotent: calling it twice is harmless.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Absent writer: every call succeeds and writes nothing.
impl<W: OutputWriter> OutputWriter for Option<W> {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        match self {
            Some(w) => w.write_event(row),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> OutputResult<()> {
        match self {
            Some(w) => w.finish(),
            None => Ok(()),
        }
    }
}

/// Fan-out: every row goes to both writers, `.0` first.
impl<A: OutputWriter, B: OutputWriter> OutputWriter for (A, B) {
    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.0.write_event(row)?;
        self.1.write_event(row)
    }

    fn finish(&mut self) -> OutputResult<()> {
        let first = self.0.finish();
        self.1.finish()?;
        first
    }
}
