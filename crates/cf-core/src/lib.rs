//! `cf-core` — foundational types for the clinic-flow simulator.
//!
//! This crate is a dependency of every other `cf-*` crate.  It has no `cf-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`ids`]     | `PatientId`, `ServerIndex`                                 |
//! | [`time`]    | `SimTime`, `SimDuration` (integer nanoseconds, may be infinite) |
//! | [`rng`]     | `ComponentRng` (one per atomic component)                  |
//! | [`patient`] | `Patient`, `RiskLevel`, `PatientStatus`, `Outcome`         |
//! | [`error`]   | `CfError`, `CfResult`                                      |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod patient;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CfError, CfResult};
pub use ids::{PatientId, ServerIndex};
pub use patient::{Outcome, Patient, PatientStatus, RiskLevel};
pub use rng::ComponentRng;
pub use time::{SimDuration, SimTime};
