//! Error types for cf-clinic.

use cf_devs::DevsError;
use cf_schedule::ScheduleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClinicError {
    /// A parameter is present and parseable but cannot be used.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Devs(#[from] DevsError),
}

pub type ClinicResult<T> = Result<T, ClinicError>;
