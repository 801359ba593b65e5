use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("cannot open {path}: {source}")]
    Open {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("schedule parse error: {0}")]
    Parse(String),

    #[error("parameter {key:?}: cannot parse {value:?} as {expected}")]
    Param {
        key:      String,
        value:    String,
        expected: &'static str,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
