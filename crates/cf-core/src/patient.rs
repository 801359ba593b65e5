//! The `Patient` entity — the only message that flows through the clinic.
//!
//! A patient is created by the arrival source, mutated by each component it
//! passes through, and leaves the simulation through exactly one of the two
//! terminal exits (rejected at the gate, or finalized after care).

use std::fmt;
use std::str::FromStr;

use crate::{PatientId, ServerIndex, SimDuration, SimTime};

// ── RiskLevel ─────────────────────────────────────────────────────────────────

/// Triage classification.  `Unknown` until the gatekeeper classifies the
/// patient (or the arrival schedule supplies a hint).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskLevel {
    #[default]
    Unknown,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    #[inline]
    pub fn is_known(self) -> bool {
        self != RiskLevel::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Unknown => "unknown",
            RiskLevel::High    => "high",
            RiskLevel::Medium  => "medium",
            RiskLevel::Low     => "low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient tag parser: case-insensitive, surrounding whitespace ignored,
/// Spanish and English tier names accepted.  Anything unrecognised maps to
/// `Unknown` rather than failing.
impl FromStr for RiskLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "alto" | "high"    => RiskLevel::High,
            "medio" | "medium" => RiskLevel::Medium,
            "bajo" | "low"     => RiskLevel::Low,
            _                  => RiskLevel::Unknown,
        })
    }
}

// ── PatientStatus ─────────────────────────────────────────────────────────────

/// Lifecycle status.  Variants are declared in lifecycle order so `Ord`
/// reflects progress through a single cycle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatientStatus {
    #[default]
    Created,
    AwaitingEvaluation,
    Prioritized,
    AwaitingAttention,
    InAttention,
    /// Left the physician; the follow-up decision is still pending.
    AttentionFinished,
    Finalized,
    Referred,
}

impl PatientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PatientStatus::Created            => "created",
            PatientStatus::AwaitingEvaluation => "awaiting_evaluation",
            PatientStatus::Prioritized        => "prioritized",
            PatientStatus::AwaitingAttention  => "awaiting_attention",
            PatientStatus::InAttention        => "in_attention",
            PatientStatus::AttentionFinished  => "attention_finished",
            PatientStatus::Finalized          => "finalized",
            PatientStatus::Referred           => "referred",
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, PatientStatus::Finalized | PatientStatus::Referred)
    }
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    #[default]
    Unset,
    Discharged,
    Referred,
    FollowUp,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Unset      => "unset",
            Outcome::Discharged => "discharged",
            Outcome::Referred   => "referred",
            Outcome::FollowUp   => "follow_up",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Patient ───────────────────────────────────────────────────────────────────

/// One simulated patient.
///
/// Times are absolute simulated instants.  The derived
/// durations (`waiting`, `service`) are stored rather than recomputed so the
/// event log shows exactly what each component observed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Patient {
    pub id:              PatientId,
    pub age:             u32,
    pub risk:            RiskLevel,
    pub status:          PatientStatus,

    pub arrival:         SimTime,
    pub attention_start: SimTime,
    pub attention_end:   SimTime,

    /// `attention_start − arrival`, set when service begins.
    pub waiting:         SimDuration,
    /// Sampled duration at service start; `attention_end − attention_start`
    /// once service completes.
    pub service:         SimDuration,

    /// `ServerIndex::INVALID` until a server begins attending the patient.
    pub server:          ServerIndex,
    pub outcome:         Outcome,

    /// Number of times the patient has been routed back for follow-up.
    pub followups_done:  u32,
}

impl Patient {
    /// A freshly created patient arriving at `arrival`.
    pub fn new(id: PatientId, age: u32, risk: RiskLevel, arrival: SimTime) -> Self {
        Self {
            id,
            age,
            risk,
            status:          PatientStatus::Created,
            arrival,
            attention_start: SimTime::ZERO,
            attention_end:   SimTime::ZERO,
            waiting:         SimDuration::ZERO,
            service:         SimDuration::ZERO,
            server:          ServerIndex::INVALID,
            outcome:         Outcome::Unset,
            followups_done:  0,
        }
    }

    /// Clear every per-cycle field ahead of a follow-up visit.
    ///
    /// Identity, age, risk and the follow-up counter survive; `now` becomes
    /// the new arrival baseline for waiting-time accounting.
    pub fn reset_for_readmission(&mut self, now: SimTime) {
        self.arrival         = now;
        self.attention_start = SimTime::ZERO;
        self.attention_end   = SimTime::ZERO;
        self.waiting         = SimDuration::ZERO;
        self.service         = SimDuration::ZERO;
        self.server          = ServerIndex::INVALID;
        self.outcome         = Outcome::Unset;
        self.status          = PatientStatus::AwaitingEvaluation;
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Patient{{id={}, age={}, risk={}, status={}, arrival={}, start={}, end={}, \
             wait={}, service={}, server={}, outcome={}, followups={}}}",
            self.id.0,
            self.age,
            self.risk,
            self.status,
            self.arrival,
            self.attention_start,
            self.attention_end,
            self.waiting,
            self.service,
            if self.server.is_valid() { i64::from(self.server.0) } else { -1 },
            self.outcome,
            self.followups_done,
        )
    }
}
