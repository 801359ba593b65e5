//! `cf-schedule` — simulation inputs: arrival schedules and parameter files.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`arrivals`] | `ArrivalRecord`, `load_arrivals_csv`, `load_arrivals_reader` |
//! | [`params`]   | `Params` (flat `key = value` map), `load_params_file`   |
//! | [`error`]    | `ScheduleError`, `ScheduleResult<T>`                    |
//!
//! Both loaders fail fast: a malformed numeric field aborts loading with the
//! offending line or key in the message.  Nothing here knows about the
//! clinic's components; `cf-clinic` turns `Params` into typed configuration.

pub mod arrivals;
pub mod error;
pub mod params;


pub use arrivals::{ArrivalRecord, load_arrivals_csv, load_arrivals_reader};
pub use error::{ScheduleError, ScheduleResult};
pub use params::{Params, load_params_file, load_params_reader};
