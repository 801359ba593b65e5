//! `ExitTally` — counts patients leaving through each top-level exit.

use std::collections::BTreeMap;

use cf_core::{Outcome, Patient, SimTime};
use cf_devs::{Port, SimObserver};

/// End-of-run summary: patients per exit and per outcome.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExitTally {
    by_exit:    BTreeMap<String, u64>,
    by_outcome: BTreeMap<Outcome, u64>,
    last_exit:  Option<SimTime>,
}

impl ExitTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patients that left through `exit` (0 if none did).
    pub fn exit_count(&self, exit: &str) -> u64 {
        self.by_exit.get(exit).copied().unwrap_or(0)
    }

    pub fn outcome_count(&self, outcome: Outcome) -> u64 {
        self.by_outcome.get(&outcome).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.by_exit.values().sum()
    }

    /// `(exit name, count)` in name order.
    pub fn exits(&self) -> impl Iterator<Item = (&str, u64)> {
        self.by_exit.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (Outcome, u64)> + '_ {
        self.by_outcome.iter().map(|(k, v)| (*k, *v))
    }

    /// Time of the last departure.
    pub fn last_exit(&self) -> Option<SimTime> {
        self.last_exit
    }
}

impl SimObserver<Patient> for ExitTally {
    fn on_exit(&mut self, time: SimTime, exit: Port, msg: &Patient) {
        *self.by_exit.entry(exit.to_string()).or_default() += 1;
        *self.by_outcome.entry(msg.outcome).or_default() += 1;
        self.last_exit = Some(time);
    }
}
