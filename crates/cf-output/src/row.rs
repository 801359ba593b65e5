//! The event-log row: one emitted message plus the patient it carried.

use cf_core::{Patient, SimTime};

/// Column names, in the order every backend writes them.
pub const COLUMNS: [&str; 15] = [
    "time",
    "component",
    "port",
    "patient_id",
    "age",
    "risk",
    "status",
    "arrival",
    "attention_start",
    "attention_end",
    "waiting",
    "service",
    "server",
    "outcome",
    "followups",
];

/// One row of the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub time:      SimTime,
    pub component: String,
    pub port:      String,
    pub patient:   Patient,
}

impl EventRow {
    pub fn new(time: SimTime, component: &str, port: impl ToString, patient: &Patient) -> Self {
        Self {
            time,
            component: component.to_owned(),
            port: port.to_string(),
            patient: patient.clone(),
        }
    }

    /// Server index, or `-1` if the patient was never assigned.
    pub fn server(&self) -> i64 {
        let s = self.patient.server;
        if s.is_valid() { i64::from(s.0) } else { -1 }
    }

    /// Every column rendered as text, matching [`COLUMNS`].
    ///
    /// Times and durations are exact decimal seconds, so two identical runs
    /// produce identical text.
    pub fn fields(&self) -> [String; 15] {
        let p = &self.patient;
        [
            self.time.to_string(),
            self.component.clone(),
            self.port.clone(),
            p.id.0.to_string(),
            p.age.to_string(),
            p.risk.as_str().to_owned(),
            p.status.as_str().to_owned(),
            p.arrival.to_string(),
            p.attention_start.to_string(),
            p.attention_end.to_string(),
            p.waiting.to_string(),
            p.service.to_string(),
            self.server().to_string(),
            p.outcome.as_str().to_owned(),
            p.followups_done.to_string(),
        ]
    }
}
