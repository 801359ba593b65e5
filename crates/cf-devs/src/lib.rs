//! `cf-devs` — a flat DEVS root coordinator.
//!
//! # Model
//!
//! Every component implements [`AtomicModel`]: a time-advance, an output
//! function, an internal transition, and an external transition over a
//! [`Bag`] of simultaneously delivered messages.  Components never reference
//! each other; the [`Coordinator`] owns them in an arena, addressed by
//! [`ComponentId`], and routes messages along a separate coupling table.
//!
//! # One simulated instant
//!
//! ```text
//! t = min over components of t_next
//!   ① Output    — every imminent component (t_next == t) emits messages.
//!   ② Route     — messages follow the coupling table; everything headed for
//!                 the same component is coalesced into one Bag.  Messages
//!                 routed to an exit leave the model (observer.on_exit).
//!   ③ Internal  — imminent components run internal_transition, then
//!                 external_transition(ZERO, bag) if they also received input.
//!   ④ External  — other receivers run external_transition(t − t_last, bag).
//!   ⑤ Reschedule— t_last = t, t_next = t + time_advance().
//! ```
//!
//! Zero time-advances make the next iteration happen at the same instant.
//! The coordinator caps the number of iterations per instant and fails with
//! [`DevsError::ZeroTimeLoop`] past the cap.

pub mod builder;
pub mod coordinator;
pub mod coupling;
pub mod error;
pub mod event_queue;
pub mod model;
pub mod observer;


pub use builder::CoordinatorBuilder;
pub use coordinator::{Coordinator, RunReport, StopReason};
pub use coupling::{ComponentId, Coupling, CouplingTable, Endpoint};
pub use error::{DevsError, DevsResult};
pub use event_queue::EventQueue;
pub use model::{AtomicModel, Bag, Port};
pub use observer::{NoopObserver, SimObserver};
