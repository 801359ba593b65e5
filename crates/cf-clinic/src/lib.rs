//! `cf-clinic` — the primary-care clinic as a network of DEVS components.
//!
//! # Components
//!
//! | Module         | Component           | Role                                            |
//! |----------------|---------------------|-------------------------------------------------|
//! | [`arrival`]    | `ArrivalSource`     | Creates patients (schedule or Poisson process)  |
//! | [`gatekeeper`] | `Gatekeeper`        | Age triage, consent gate, re-admission          |
//! | [`dispatcher`] | `Dispatcher`        | Round-robin assignment to servers               |
//! | [`server`]     | `Server`            | One physician, FIFO line, exponential service   |
//! | [`followup`]   | `FollowUpDecision`  | Return for follow-up, or discharge/referral     |
//!
//! [`component::ClinicComponent`] closes the set for the coordinator, and
//! [`topology::Clinic`] wires everything together from a [`ClinicConfig`].
//!
//! # Determinism
//!
//! Each stochastic component owns one `ComponentRng` seeded from
//! configuration, and the coordinator delivers bags in a fixed order, so a
//! given configuration always produces the same event sequence.

pub mod arrival;
pub mod component;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod followup;
pub mod gatekeeper;
pub mod ports;
pub mod server;
pub mod topology;

#[cfg(test)]
mod tests;

pub use arrival::ArrivalSource;
pub use component::ClinicComponent;
pub use config::{ArrivalConfig, ClinicConfig, FollowUpConfig, GatekeeperConfig, RunConfig, StaffConfig};
pub use dispatcher::Dispatcher;
pub use error::{ClinicError, ClinicResult};
pub use followup::FollowUpDecision;
pub use gatekeeper::{Gatekeeper, classify_by_age};
pub use server::Server;
pub use topology::Clinic;
