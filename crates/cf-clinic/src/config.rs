//! Typed configuration for the clinic, built from a flat [`Params`] map.
//!
//! Missing keys take the defaults below.  A present key whose value cannot
//! be parsed is a fatal error.  Degenerate values that still describe a
//! well-defined run (a non-positive server count, an out-of-range
//! probability) are normalized and logged at `warn` level.

use std::path::PathBuf;

use cf_core::SimTime;
use cf_devs::builder::DEFAULT_MAX_INSTANT_ITERATIONS;
use cf_schedule::Params;
use tracing::warn;

use crate::{ClinicError, ClinicResult};

// ── Section structs ───────────────────────────────────────────────────────────

/// Run-wide settings: horizon, seed, log destination.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Global seed.  Per-component seeds default to values derived from it.
    pub rng_seed: u64,

    /// Simulation horizon.  `SimTime::INFINITY` runs until every component
    /// is passive.
    pub until: SimTime,

    pub log_csv: PathBuf,

    /// Optional SQLite copy of the event log.
    pub log_sqlite: Option<PathBuf>,

    /// Single-byte field separator for the CSV event log.
    pub csv_sep: u8,

    /// Cap on coordinator iterations at one simulated instant.
    pub max_instant_iterations: usize,
}

/// ArrivalSource settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrivalConfig {
    pub rng_seed: u64,
    /// Arrivals per second in stochastic mode.  Non-positive ⇒ no arrivals.
    pub rate: f64,
    /// Deterministic schedule; `Some` selects scheduled mode.
    pub schedule_path: Option<PathBuf>,
    /// Stochastic-mode cap on generated patients; 0 means unlimited.
    pub max_patients: u32,
    /// Age used in stochastic mode and for schedule rows with age 0.
    pub default_age: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GatekeeperConfig {
    pub rng_seed: u64,
    /// Probability that a patient consents and is admitted, in [0, 1].
    pub p_accept: f64,
    /// Age at or above which an unclassified patient is high risk.
    pub age_high: u32,
    /// Age at or above which an unclassified patient is medium risk.
    pub age_medium: u32,
}

/// Physician pool settings.
#[derive(Clone, Debug, PartialEq)]
pub struct StaffConfig {
    /// Number of servers (always ≥ 1 after normalization).
    pub servers: u16,
    /// Mean of the exponential service time, in seconds.
    pub service_mean: f64,
    /// Server `i` is seeded with `rng_seed_base + i`.
    pub rng_seed_base: u64,
}

/// FollowUpDecision settings.  Multipliers and referral probabilities are
/// per risk tier.
#[derive(Clone, Debug, PartialEq)]
pub struct FollowUpConfig {
    pub rng_seed: u64,
    pub p_continue_base: f64,
    pub mult_high: f64,
    pub mult_medium: f64,
    pub mult_low: f64,
    pub max_followups: u32,
    pub p_referral_high: f64,
    pub p_referral_medium: f64,
    pub p_referral_low: f64,
}

/// Complete clinic configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct ClinicConfig {
    pub run:        RunConfig,
    pub arrivals:   ArrivalConfig,
    pub gatekeeper: GatekeeperConfig,
    pub staff:      StaffConfig,
    pub follow_up:  FollowUpConfig,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

const DEFAULT_SEED: u64 = 1;

impl ClinicConfig {
    /// Defaults with every per-component seed derived from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            run: RunConfig {
                rng_seed: seed,
                until: SimTime::from_secs(3600),
                log_csv: PathBuf::from("simulation_results/cesfam_log.csv"),
                log_sqlite: None,
                csv_sep: b';',
                max_instant_iterations: DEFAULT_MAX_INSTANT_ITERATIONS,
            },
            arrivals: ArrivalConfig {
                rng_seed: seed,
                rate: 0.05,
                schedule_path: None,
                max_patients: 100,
                default_age: 70,
            },
            gatekeeper: GatekeeperConfig {
                rng_seed: seed.wrapping_add(1),
                p_accept: 1.0,
                age_high: 80,
                age_medium: 70,
            },
            staff: StaffConfig {
                servers: 3,
                service_mean: 600.0,
                rng_seed_base: 1000,
            },
            follow_up: FollowUpConfig {
                rng_seed: seed.wrapping_add(2),
                p_continue_base: 0.30,
                mult_high: 1.20,
                mult_medium: 1.00,
                mult_low: 0.80,
                max_followups: 3,
                p_referral_high: 0.15,
                p_referral_medium: 0.05,
                p_referral_low: 0.05,
            },
        }
    }

    /// Build a configuration from a parameter file's contents.
    pub fn from_params(params: &Params) -> ClinicResult<Self> {
        let seed = params.u64_or("simulation.rng_seed", DEFAULT_SEED)?;
        let d = Self::with_seed(seed);

        let run = RunConfig {
            rng_seed: seed,
            until: horizon(params.f64_or("simulation.until", d.run.until.as_secs_f64())?)?,
            log_csv: PathBuf::from(params.string_or("simulation.log_csv", &d.run.log_csv.to_string_lossy())),
            log_sqlite: params.get("simulation.log_sqlite").filter(|s| !s.is_empty()).map(PathBuf::from),
            csv_sep: separator(params.get("simulation.csv_sep"), d.run.csv_sep)?,
            max_instant_iterations: to_usize(
                "simulation.max_instant_iterations",
                params.u64_or("simulation.max_instant_iterations", d.run.max_instant_iterations as u64)?,
            )?,
        };

        let schedule = params.string_or("arrivals.csv", "");
        let arrivals = ArrivalConfig {
            rng_seed: params.u64_or("generator.rng_seed", d.arrivals.rng_seed)?,
            rate: params.f64_or("arrivals.rate", d.arrivals.rate)?,
            schedule_path: (!schedule.is_empty()).then(|| PathBuf::from(schedule)),
            max_patients: to_u32("arrivals.max_patients", params.u64_or("arrivals.max_patients", d.arrivals.max_patients.into())?)?,
            default_age: to_u32("patients.default_age", params.u64_or("patients.default_age", d.arrivals.default_age.into())?)?,
        };
        if arrivals.schedule_path.is_none() && !(arrivals.rate > 0.0 && arrivals.rate.is_finite()) {
            warn!(rate = arrivals.rate, "arrivals.rate is not a positive finite number; no patients will arrive");
        }
        if arrivals.schedule_path.is_none() && arrivals.max_patients == 0 && run.until.is_infinite() {
            warn!("arrivals.max_patients = 0 with no horizon; arrivals only stop when patient ids run out");
        }

        let gatekeeper = GatekeeperConfig {
            rng_seed: params.u64_or("case_manager.rng_seed", d.gatekeeper.rng_seed)?,
            p_accept: probability("consent.p_accept", params.f64_or("consent.p_accept", d.gatekeeper.p_accept)?),
            age_high: to_u32("triage.age_high", params.u64_or("triage.age_high", d.gatekeeper.age_high.into())?)?,
            age_medium: to_u32("triage.age_medium", params.u64_or("triage.age_medium", d.gatekeeper.age_medium.into())?)?,
        };
        if gatekeeper.age_medium > gatekeeper.age_high {
            warn!(
                age_high = gatekeeper.age_high,
                age_medium = gatekeeper.age_medium,
                "triage.age_medium exceeds triage.age_high; no patient will be classified medium risk"
            );
        }

        let staff = StaffConfig {
            servers: server_count(params.i64_or("router.doctors", d.staff.servers.into())?)?,
            service_mean: params.f64_or("service.mean", d.staff.service_mean)?,
            rng_seed_base: params.u64_or("service.rng_seed_base", d.staff.rng_seed_base)?,
        };
        if !(staff.service_mean > 0.0) {
            warn!(mean = staff.service_mean, "service.mean is not positive; every service lasts 1 ns");
        }

        let f = &d.follow_up;
        let follow_up = FollowUpConfig {
            rng_seed: params.u64_or("adherence.rng_seed", f.rng_seed)?,
            p_continue_base: params.f64_or("adherence.p_continue_base", f.p_continue_base)?,
            mult_high: params.f64_or("adherence.mult_alto", f.mult_high)?,
            mult_medium: params.f64_or("adherence.mult_medio", f.mult_medium)?,
            mult_low: params.f64_or("adherence.mult_bajo", f.mult_low)?,
            max_followups: to_u32("adherence.max_followups", params.u64_or("adherence.max_followups", f.max_followups.into())?)?,
            p_referral_high: probability("adherence.p_referral_alto", params.f64_or("adherence.p_referral_alto", f.p_referral_high)?),
            p_referral_medium: probability("adherence.p_referral_medio", params.f64_or("adherence.p_referral_medio", f.p_referral_medium)?),
            p_referral_low: probability("adherence.p_referral_bajo", params.f64_or("adherence.p_referral_bajo", f.p_referral_low)?),
        };

        Ok(Self { run, arrivals, gatekeeper, staff, follow_up })
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }
}

// ── Normalization helpers ─────────────────────────────────────────────────────

/// `≤ 0` means "run until idle".
fn horizon(secs: f64) -> ClinicResult<SimTime> {
    if secs <= 0.0 {
        return Ok(SimTime::INFINITY);
    }
    SimTime::try_from_secs(secs).map_err(|e| ClinicError::Config(format!("simulation.until: {e}")))
}

fn separator(raw: Option<&str>, default: u8) -> ClinicResult<u8> {
    match raw {
        None | Some("") => Ok(default),
        Some(s) if s.len() == 1 => Ok(s.as_bytes()[0]),
        Some("\\t") | Some("tab") => Ok(b'\t'),
        Some(s) => Err(ClinicError::Config(format!("simulation.csv_sep must be a single byte, got {s:?}"))),
    }
}

fn probability(key: &str, p: f64) -> f64 {
    if p.is_nan() {
        warn!(key, "probability is NaN; using 0");
        return 0.0;
    }
    let clamped = p.clamp(0.0, 1.0);
    if clamped != p {
        warn!(key, value = p, clamped, "probability outside [0, 1]; clamped");
    }
    clamped
}

fn server_count(n: i64) -> ClinicResult<u16> {
    if n < 1 {
        warn!(doctors = n, "router.doctors must be at least 1; using 1");
        return Ok(1);
    }
    u16::try_from(n).map_err(|_| ClinicError::Config(format!("router.doctors = {n} is too large")))
}

fn to_u32(key: &str, v: u64) -> ClinicResult<u32> {
    u32::try_from(v).map_err(|_| ClinicError::Config(format!("{key} = {v} is too large")))
}

fn to_usize(key: &str, v: u64) -> ClinicResult<usize> {
    usize::try_from(v).map_err(|_| ClinicError::Config(format!("{key} = {v} is too large")))
}
