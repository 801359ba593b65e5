//! `EventQueue` — sparse map from simulated instants to components due then.
//!
//! Components are pushed each time they are rescheduled and never removed
//! eagerly, so an entry may be stale (the component has since been
//! rescheduled elsewhere).  The coordinator filters stale entries against
//! each component's current `t_next` when it drains an instant.
//!
//! `BTreeMap` gives O(log W) insert and pop where W is the number of distinct
//! pending instants.

use std::collections::BTreeMap;

use cf_core::SimTime;

use crate::ComponentId;

#[derive(Debug, Default)]
pub struct EventQueue {
    inner: BTreeMap<SimTime, Vec<ComponentId>>,
    /// Cached total entry count for O(1) `len()`.
    total: usize,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `component` at `time`.  Infinite times are ignored.
    pub fn push(&mut self, time: SimTime, component: ComponentId) {
        if time.is_infinite() {
            return;
        }
        self.inner.entry(time).or_default().push(component);
        self.total += 1;
    }

    /// Remove and return every entry at exactly `time`.
    pub fn drain_time(&mut self, time: SimTime) -> Option<Vec<ComponentId>> {
        let ids = self.inner.remove(&time)?;
        self.total -= ids.len();
        Some(ids)
    }

    /// The earliest instant with at least one entry, or `None` if empty.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Total number of (instant, component) entries, stale ones included.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
