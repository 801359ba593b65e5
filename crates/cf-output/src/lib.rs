//! `cf-output` — the append-only event log.
//!
//! Two backends are provided:
//!
//! | Feature   | Backend | Storage                                    |
//! |-----------|---------|--------------------------------------------|
//! | *(none)*  | CSV     | one delimited file with a header row       |
//! | `sqlite`  | SQLite  | table `event_log` in the given database    |
//!
//! Both implement [`OutputWriter`] and are driven by [`EventLogObserver`],
//! which implements `cf_devs::SimObserver<Patient>`.  [`ExitTally`] is a
//! second observer that counts departures for the end-of-run summary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cf_output::{CsvWriter, EventLogObserver, ExitTally};
//!
//! let writer = CsvWriter::create(Path::new("log.csv"), b';')?;
//! let mut obs = (EventLogObserver::new(writer), ExitTally::new());
//! clinic.run(&mut obs)?;
//! if let Some(e) = obs.0.take_error() { return Err(e.into()); }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod tally;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::EventLogObserver;
pub use row::{COLUMNS, EventRow};
pub use tally::ExitTally;
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
