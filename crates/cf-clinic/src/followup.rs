//! `FollowUpDecision` — decides whether a patient comes back for another
//! visit or leaves the clinic.

use cf_core::{ComponentRng, Outcome, Patient, PatientStatus, RiskLevel, SimDuration, SimTime};
use cf_devs::{AtomicModel, Bag, Port};
use tracing::trace;

use crate::config::FollowUpConfig;
use crate::ports::{IN_PATIENT, OUT_FINALIZED, OUT_RETURN};

/// Per completed patient: return with probability
/// `clamp(base × multiplier(risk), 0, 1)` unless the follow-up cap is
/// reached, otherwise finalize as referred (risk-dependent probability) or
/// discharged.
///
/// Draws per patient: one for the return decision (skipped at the cap), and
/// one more for the referral decision when finalizing.  Unclassified
/// patients use the medium-risk parameters.
pub struct FollowUpDecision {
    now:       SimTime,
    config:    FollowUpConfig,
    rng:       ComponentRng,
    returning: Vec<Patient>,
    finalized: Vec<Patient>,
}

impl FollowUpDecision {
    pub fn new(config: &FollowUpConfig) -> Self {
        Self {
            now:       SimTime::ZERO,
            rng:       ComponentRng::new(config.rng_seed),
            config:    config.clone(),
            returning: Vec::new(),
            finalized: Vec::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Probability that a patient of `risk` returns, in [0, 1].
    pub fn return_probability(&self, risk: RiskLevel) -> f64 {
        let mult = match risk {
            RiskLevel::High => self.config.mult_high,
            RiskLevel::Low => self.config.mult_low,
            RiskLevel::Medium | RiskLevel::Unknown => self.config.mult_medium,
        };
        let p = self.config.p_continue_base * mult;
        if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
    }

    pub fn referral_probability(&self, risk: RiskLevel) -> f64 {
        match risk {
            RiskLevel::High => self.config.p_referral_high,
            RiskLevel::Low => self.config.p_referral_low,
            RiskLevel::Medium | RiskLevel::Unknown => self.config.p_referral_medium,
        }
    }

    fn decide(&mut self, mut patient: Patient) {
        if patient.followups_done < self.config.max_followups {
            let p = self.return_probability(patient.risk);
            if self.rng.chance(p) {
                patient.followups_done += 1;
                patient.outcome = Outcome::FollowUp;
                trace!(patient = %patient.id, followups = patient.followups_done, "returns");
                self.returning.push(patient);
                return;
            }
        }
        self.finalize(patient);
    }

    fn finalize(&mut self, mut patient: Patient) {
        let p = self.referral_probability(patient.risk);
        if self.rng.chance(p) {
            patient.status = PatientStatus::Referred;
            patient.outcome = Outcome::Referred;
        } else {
            patient.status = PatientStatus::Finalized;
            patient.outcome = Outcome::Discharged;
        }
        trace!(patient = %patient.id, outcome = %patient.outcome, "finalized");
        self.finalized.push(patient);
    }
}

impl AtomicModel for FollowUpDecision {
    type Message = Patient;

    fn time_advance(&self) -> SimDuration {
        if self.returning.is_empty() && self.finalized.is_empty() {
            SimDuration::INFINITY
        } else {
            SimDuration::ZERO
        }
    }

    fn output(&self) -> Vec<(Port, Patient)> {
        let back = self.returning.iter().map(|p| (OUT_RETURN, p.clone()));
        let out = self.finalized.iter().map(|p| (OUT_FINALIZED, p.clone()));
        back.chain(out).collect()
    }

    fn internal_transition(&mut self) {
        self.returning.clear();
        self.finalized.clear();
    }

    fn external_transition(&mut self, elapsed: SimDuration, bag: Bag<Patient>) {
        self.now += elapsed;
        for (port, patient) in bag {
            if port == IN_PATIENT {
                self.decide(patient);
            }
        }
    }
}
