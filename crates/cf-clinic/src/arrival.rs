//! `ArrivalSource` — creates patients, from a schedule or a Poisson process.

use cf_core::{ComponentRng, Patient, PatientId, RiskLevel, SimDuration, SimTime};
use cf_devs::{AtomicModel, Bag, Port};
use cf_schedule::ArrivalRecord;
use tracing::warn;

use crate::config::ArrivalConfig;
use crate::ports::OUT_PATIENT;

enum Mode {
    /// Pre-sorted records; `cursor` is the next one to emit.
    Scheduled { records: Vec<ArrivalRecord>, cursor: usize },
    /// Exponential inter-arrival gaps with mean `1 / rate`.
    Stochastic { mean_gap: f64, max_patients: u32, rng: ComponentRng },
}

/// Emits one new patient per internal event.
///
/// Identifiers start at 1 and increase by one per patient.  Once the
/// schedule is exhausted, the stochastic cap is reached or the identifier
/// space runs out, the source is passive forever.
pub struct ArrivalSource {
    now:         SimTime,
    next:        SimTime,
    next_id:     u32,
    default_age: u32,
    mode:        Mode,
    done:        bool,
}

impl ArrivalSource {
    /// Replay `records` (sorted by time) in order.
    pub fn scheduled(records: Vec<ArrivalRecord>, default_age: u32) -> Self {
        let next = records.first().map_or(SimTime::INFINITY, |r| r.time);
        Self {
            now: SimTime::ZERO,
            next,
            next_id: 1,
            default_age,
            done: records.is_empty(),
            mode: Mode::Scheduled { records, cursor: 0 },
        }
    }

    /// Poisson arrivals at `config.rate` per second.
    ///
    /// The first patient arrives at the mean gap `1 / rate`.  A non-positive
    /// or non-finite rate gives a source that never fires.
    pub fn stochastic(config: &ArrivalConfig) -> Self {
        let live = config.rate > 0.0 && config.rate.is_finite();
        let mean_gap = if live { 1.0 / config.rate } else { 0.0 };
        let next = if live { SimTime::ZERO + gap(mean_gap) } else { SimTime::INFINITY };
        Self {
            now: SimTime::ZERO,
            next,
            next_id: 1,
            default_age: config.default_age,
            done: !live,
            mode: Mode::Stochastic {
                mean_gap,
                max_patients: config.max_patients,
                rng: ComponentRng::new(config.rng_seed),
            },
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    #[cfg(test)]
    pub(crate) fn starting_at(mut self, id: PatientId) -> Self {
        self.next_id = id.0;
        self
    }

    /// Number of patients emitted so far.
    pub fn emitted(&self) -> u32 {
        self.next_id - 1
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn finish(&mut self) {
        self.done = true;
        self.next = SimTime::INFINITY;
    }
}

/// A sampled gap, never zero.
fn gap(secs: f64) -> SimDuration {
    SimDuration::from_secs_f64(secs).max(SimDuration::EPSILON)
}

impl AtomicModel for ArrivalSource {
    type Message = Patient;

    fn time_advance(&self) -> SimDuration {
        if self.done {
            return SimDuration::INFINITY;
        }
        self.next.since(self.now)
    }

    fn output(&self) -> Vec<(Port, Patient)> {
        if self.done {
            return vec![];
        }
        let (age, risk) = match &self.mode {
            Mode::Scheduled { records, cursor } => match records.get(*cursor) {
                Some(r) => (if r.age > 0 { r.age } else { self.default_age }, r.risk),
                None => return vec![],
            },
            Mode::Stochastic { .. } => (self.default_age, RiskLevel::Unknown),
        };
        vec![(OUT_PATIENT, Patient::new(PatientId(self.next_id), age, risk, self.next))]
    }

    fn internal_transition(&mut self) {
        if self.done {
            return;
        }
        self.now = self.next;
        match self.next_id.checked_add(1).filter(|&id| id != PatientId::INVALID.0) {
            Some(id) => self.next_id = id,
            None => {
                self.next_id = PatientId::INVALID.0;
                warn!(emitted = self.emitted(), "patient identifiers exhausted; no further arrivals");
                self.finish();
                return;
            }
        }

        let next = match &mut self.mode {
            Mode::Scheduled { records, cursor } => {
                *cursor += 1;
                // Records are sorted; `max` only guards a hand-built list.
                records.get(*cursor).map(|r| r.time.max(self.now))
            }
            Mode::Stochastic { mean_gap, max_patients, rng } => {
                if *max_patients > 0 && self.next_id > *max_patients {
                    None
                } else {
                    Some(self.now + gap(rng.exponential(*mean_gap)))
                }
            }
        };
        match next {
            Some(t) => self.next = t,
            None => self.finish(),
        }
    }

    /// The source has no inputs; this only keeps the local clock in step.
    fn external_transition(&mut self, elapsed: SimDuration, _bag: Bag<Patient>) {
        self.now += elapsed;
    }
}
