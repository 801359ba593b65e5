//! Flat `key = value` parameter files.
//!
//! ```text
//! # comment
//! ; also a comment
//! simulation.until = 3600
//! consent.p_accept = 0.9
//! arrivals.csv     = input_data/arrivals.csv
//! ```
//!
//! Keys and values are trimmed.  Lines without `=` are ignored, and a later
//! duplicate key overrides an earlier one.  Typed getters take a default for
//! missing keys but fail on a present, unparseable value.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use crate::{ScheduleError, ScheduleResult};

/// Parsed parameter file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or override) a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw string value, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// String value or `default`.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_owned()
    }

    pub fn f64_or(&self, key: &str, default: f64) -> ScheduleResult<f64> {
        self.parsed_or(key, default, "a number")
    }

    pub fn i64_or(&self, key: &str, default: i64) -> ScheduleResult<i64> {
        self.parsed_or(key, default, "an integer")
    }

    pub fn u64_or(&self, key: &str, default: u64) -> ScheduleResult<u64> {
        self.parsed_or(key, default, "a non-negative integer")
    }

    fn parsed_or<T: FromStr>(&self, key: &str, default: T, expected: &'static str) -> ScheduleResult<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| self.param_error(key, raw, expected)),
        }
    }

    fn param_error(&self, key: &str, raw: &str, expected: &'static str) -> ScheduleError {
        ScheduleError::Param {
            key: key.to_owned(),
            value: raw.to_owned(),
            expected,
        }
    }
}

/// Read a parameter file from disk.
pub fn load_params_file(path: &Path) -> ScheduleResult<Params> {
    let file = std::fs::File::open(path).map_err(|source| ScheduleError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_params_reader(file)
}

/// Like [`load_params_file`] but accepts any `Read` source.
pub fn load_params_reader<R: Read>(reader: R) -> ScheduleResult<Params> {
    let mut params = Params::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !key.is_empty() {
            params.set(key, value.trim());
        }
    }
    Ok(params)
}
