//! Simulation time model.
//!
//! # Design
//!
//! DEVS components advance on a continuous clock, but the canonical unit
//! here is an integer count of nanoseconds since t0:
//!
//!   seconds = nanos / 1e9
//!
//! Integer time keeps all arithmetic exact: a component that tracks its own
//! clock as `now + elapsed` lands on exactly the instant the coordinator
//! computed, and `start + (end − start) == end` always holds.  Stochastic
//! samples are drawn in seconds (`f64`) and rounded to the nearest
//! nanosecond once, at the boundary.
//!
//! `u64::MAX` is reserved as infinity on both types.  A component whose
//! time-advance is [`SimDuration::INFINITY`] is passive.  At 1 ns resolution
//! a `u64` spans ~584 years of simulated time.

use std::fmt;

use crate::{CfError, CfResult};

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_SEC_F64: f64 = 1e9;

/// Largest finite number of seconds representable without reaching the
/// infinity sentinel.
const MAX_FINITE_SECS: f64 = (u64::MAX - 1) as f64 / NANOS_PER_SEC_F64;

// ── SimDuration ──────────────────────────────────────────────────────────────

/// A span of simulated time in nanoseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDuration(pub u64);

impl SimDuration {
    pub const ZERO: SimDuration = SimDuration(0);
    /// The smallest positive representable duration (1 ns).
    pub const EPSILON: SimDuration = SimDuration(1);
    pub const INFINITY: SimDuration = SimDuration(u64::MAX);

    /// Round a non-negative number of seconds to the nearest nanosecond.
    ///
    /// Saturating: NaN and negative inputs give `ZERO`, `+inf` and values too
    /// large to represent give `INFINITY`.  Intended for sampled durations,
    /// which must never fail.
    pub fn from_secs_f64(secs: f64) -> SimDuration {
        if secs.is_nan() || secs <= 0.0 {
            SimDuration::ZERO
        } else if secs > MAX_FINITE_SECS {
            SimDuration::INFINITY
        } else {
            SimDuration((secs * NANOS_PER_SEC_F64).round() as u64)
        }
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        self == SimDuration::INFINITY
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn as_secs_f64(self) -> f64 {
        if self.is_infinite() { f64::INFINITY } else { self.0 as f64 / NANOS_PER_SEC_F64 }
    }
}

impl fmt::Display for SimDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nanos(f, self.0)
    }
}

// ── SimTime ──────────────────────────────────────────────────────────────────

/// An absolute simulated instant, in nanoseconds since the start of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const INFINITY: SimTime = SimTime(u64::MAX);

    /// Validate an externally supplied instant in seconds (schedule rows,
    /// horizons).
    ///
    /// NaN, negative, and finite-but-unrepresentable values are rejected;
    /// `+inf` maps to [`SimTime::INFINITY`].
    pub fn try_from_secs(secs: f64) -> CfResult<SimTime> {
        if secs.is_nan() {
            return Err(CfError::Parse("time is NaN".into()));
        }
        if secs < 0.0 {
            return Err(CfError::Parse(format!("time {secs} is negative")));
        }
        if secs.is_infinite() {
            return Ok(SimTime::INFINITY);
        }
        if secs > MAX_FINITE_SECS {
            return Err(CfError::Parse(format!("time {secs} is out of range")));
        }
        Ok(SimTime((secs * NANOS_PER_SEC_F64).round() as u64))
    }

    /// Whole seconds, for tests and constants.
    pub const fn from_secs(secs: u64) -> SimTime {
        SimTime(secs * NANOS_PER_SEC)
    }

    #[inline]
    pub fn is_infinite(self) -> bool {
        self == SimTime::INFINITY
    }

    pub fn as_secs_f64(self) -> f64 {
        if self.is_infinite() { f64::INFINITY } else { self.0 as f64 / NANOS_PER_SEC_F64 }
    }

    /// Time elapsed from `earlier` to `self`, clamped at zero.
    ///
    /// `INFINITY` minus anything finite stays `INFINITY`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> SimDuration {
        if self.is_infinite() && !earlier.is_infinite() {
            return SimDuration::INFINITY;
        }
        SimDuration(self.0.saturating_sub(earlier.0))
    }
}

impl std::ops::Add<SimDuration> for SimTime {
    type Output = SimTime;

    /// Saturates at `INFINITY`; an infinite duration gives `INFINITY`.
    #[inline]
    fn add(self, rhs: SimDuration) -> SimTime {
        if rhs.is_infinite() {
            return SimTime::INFINITY;
        }
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::AddAssign<SimDuration> for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: SimDuration) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for SimTime {
    type Output = SimDuration;

    #[inline]
    fn sub(self, rhs: SimTime) -> SimDuration {
        self.since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nanos(f, self.0)
    }
}

/// Exact decimal seconds: `12.500000000`, or `inf` for the sentinel.
fn write_nanos(f: &mut fmt::Formatter<'_>, nanos: u64) -> fmt::Result {
    if nanos == u64::MAX {
        return f.write_str("inf");
    }
    write!(f, "{}.{:09}", nanos / NANOS_PER_SEC, nanos % NANOS_PER_SEC)
}
