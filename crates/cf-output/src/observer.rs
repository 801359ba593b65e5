//! `EventLogObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use cf_core::{Patient, SimTime};
use cf_devs::{Port, SimObserver};
use tracing::debug;

use crate::writer::OutputWriter;
use crate::{EventRow, OutputError, OutputResult};

/// A [`SimObserver`] that appends one [`EventRow`] per emitted message to
/// any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `run()` returns, check for errors with
/// [`take_error`][Self::take_error].  Once a write has failed, later rows
/// are dropped.
pub struct EventLogObserver<W: OutputWriter> {
    writer:     W,
    rows:       u64,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> EventLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: 0, last_error: None }
    }

    /// Take the stored write error (if any) after the run returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Rows handed to the writer so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Unwrap the inner writer (e.g. to inspect output after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver<Patient> for EventLogObserver<W> {
    fn on_output(&mut self, time: SimTime, component: &str, port: Port, msg: &Patient) {
        if self.last_error.is_some() {
            return;
        }
        let row = EventRow::new(time, component, port, msg);
        let result = self.writer.write_event(&row);
        if result.is_ok() {
            self.rows += 1;
        }
        self.store_err(result);
    }

    fn on_sim_end(&mut self, final_time: SimTime) {
        let result = self.writer.finish();
        self.store_err(result);
        debug!(rows = self.rows, final_time = %final_time, "event log closed");
    }
}
