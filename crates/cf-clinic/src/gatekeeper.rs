//! `Gatekeeper` — triage, consent gate, and re-admission of returning
//! patients.

use cf_core::{ComponentRng, Outcome, Patient, PatientStatus, RiskLevel, SimDuration, SimTime};
use cf_devs::{AtomicModel, Bag, Port};
use tracing::trace;

use crate::config::GatekeeperConfig;
use crate::ports::{IN_PATIENT, IN_RETURN, OUT_ACCEPTED, OUT_REJECTED};

/// Age-threshold triage: `age ≥ high` is high risk, `age ≥ medium` is
/// medium risk, anything younger is low risk.
pub fn classify_by_age(age: u32, high: u32, medium: u32) -> RiskLevel {
    if age >= high {
        RiskLevel::High
    } else if age >= medium {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Classifies and gates every incoming patient, then flushes both buffers at
/// zero time-advance.
///
/// One uniform draw is consumed per patient, in bag order.
pub struct Gatekeeper {
    now:        SimTime,
    p_accept:   f64,
    age_high:   u32,
    age_medium: u32,
    rng:        ComponentRng,
    accepted:   Vec<Patient>,
    rejected:   Vec<Patient>,
}

impl Gatekeeper {
    pub fn new(config: &GatekeeperConfig) -> Self {
        Self {
            now:        SimTime::ZERO,
            p_accept:   config.p_accept,
            age_high:   config.age_high,
            age_medium: config.age_medium,
            rng:        ComponentRng::new(config.rng_seed),
            accepted:   Vec::new(),
            rejected:   Vec::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Patients waiting to be flushed as `(accepted, rejected)`.
    pub fn pending(&self) -> (usize, usize) {
        (self.accepted.len(), self.rejected.len())
    }

    fn admit(&mut self, mut patient: Patient, returning: bool) {
        if returning {
            patient.reset_for_readmission(self.now);
        } else {
            patient.status = PatientStatus::AwaitingEvaluation;
        }
        if !patient.risk.is_known() {
            patient.risk = classify_by_age(patient.age, self.age_high, self.age_medium);
        }
        patient.status = PatientStatus::Prioritized;

        if self.rng.chance(self.p_accept) {
            patient.status = PatientStatus::AwaitingAttention;
            trace!(patient = %patient.id, risk = %patient.risk, returning, "accepted");
            self.accepted.push(patient);
        } else {
            // Not handled here: the patient is referred elsewhere.
            patient.status = PatientStatus::Finalized;
            patient.outcome = Outcome::Referred;
            trace!(patient = %patient.id, risk = %patient.risk, returning, "rejected");
            self.rejected.push(patient);
        }
    }
}

impl AtomicModel for Gatekeeper {
    type Message = Patient;

    fn time_advance(&self) -> SimDuration {
        if self.accepted.is_empty() && self.rejected.is_empty() {
            SimDuration::INFINITY
        } else {
            SimDuration::ZERO
        }
    }

    fn output(&self) -> Vec<(Port, Patient)> {
        let accepted = self.accepted.iter().map(|p| (OUT_ACCEPTED, p.clone()));
        let rejected = self.rejected.iter().map(|p| (OUT_REJECTED, p.clone()));
        accepted.chain(rejected).collect()
    }

    fn internal_transition(&mut self) {
        self.accepted.clear();
        self.rejected.clear();
    }

    fn external_transition(&mut self, elapsed: SimDuration, bag: Bag<Patient>) {
        self.now += elapsed;
        for (port, patient) in bag {
            if port == IN_PATIENT {
                self.admit(patient, false);
            } else if port == IN_RETURN {
                self.admit(patient, true);
            }
        }
    }
}
