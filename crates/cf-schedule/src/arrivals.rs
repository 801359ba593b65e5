//! Deterministic arrival-schedule loader.
//!
//! # CSV format
//!
//! One row per arrival, comma-separated:
//!
//! ```csv
//! time,age,risk
//! 0,82,alto
//! 120.5,45,
//! 300,0,unknown
//! ```
//!
//! | Column | Meaning                                                        |
//! |--------|----------------------------------------------------------------|
//! | `time` | absolute arrival time in seconds (required, ≥ 0)               |
//! | `age`  | non-negative integer; empty or `0` means "use the default age" |
//! | `risk` | `alto`/`high`, `medio`/`medium`, `bajo`/`low`, anything else or empty ⇒ unknown |
//!
//! The header row is optional: the first row is skipped when one of its
//! fields mentions `time` or `hora`.  Lines starting with `#` and blank lines
//! are ignored.  Rows are stably sorted by time after loading.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use cf_core::{RiskLevel, SimTime};

use crate::ScheduleError;

/// One scheduled arrival.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArrivalRecord {
    pub time: SimTime,
    /// `0` means "use the configured default age".
    pub age:  u32,
    pub risk: RiskLevel,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and time-sort an arrival schedule from a CSV file.
pub fn load_arrivals_csv(path: &Path) -> Result<Vec<ArrivalRecord>, ScheduleError> {
    let file = std::fs::File::open(path).map_err(|source| ScheduleError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_arrivals_reader(file)
}

/// Like [`load_arrivals_csv`] but accepts any `Read` source.
pub fn load_arrivals_reader<R: Read>(reader: R) -> Result<Vec<ArrivalRecord>, ScheduleError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut out = Vec::new();
    let mut first = true;

    for result in csv_reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if first {
            first = false;
            if is_header(&record) {
                continue;
            }
        }
        out.push(parse_record(&record)?);
    }

    // Stable: equal times keep file order.
    out.sort_by(|a, b| a.time.cmp(&b.time));
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn is_header(record: &StringRecord) -> bool {
    record.iter().any(|f| {
        let f = f.to_ascii_lowercase();
        f.contains("time") || f.contains("hora")
    })
}

fn parse_record(record: &StringRecord) -> Result<ArrivalRecord, ScheduleError> {
    let line = record.position().map_or(0, |p| p.line());
    let field = |i: usize| record.get(i).unwrap_or("");

    let raw_time = field(0);
    let secs: f64 = raw_time.parse().map_err(|_| {
        ScheduleError::Parse(format!("line {line}: invalid arrival time {raw_time:?}"))
    })?;
    let time = SimTime::try_from_secs(secs)
        .map_err(|e| ScheduleError::Parse(format!("line {line}: {e}")))?;
    if time.is_infinite() {
        return Err(ScheduleError::Parse(format!("line {line}: arrival time must be finite")));
    }

    let raw_age = field(1);
    let age = if raw_age.is_empty() {
        0
    } else {
        raw_age.parse::<u32>().map_err(|_| {
            ScheduleError::Parse(format!(
                "line {line}: invalid age {raw_age:?}: expected a non-negative integer"
            ))
        })?
    };

    let risk = field(2).parse::<RiskLevel>().unwrap_or_default();

    Ok(ArrivalRecord { time, age, risk })
}
