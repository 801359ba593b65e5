//! The `Coordinator` struct and its event loop.

use std::collections::BTreeMap;

use cf_core::{SimDuration, SimTime};
use tracing::{debug, info, trace};

use crate::{AtomicModel, Bag, ComponentId, CouplingTable, DevsError, DevsResult, Endpoint, EventQueue, SimObserver};

// ── Slot ──────────────────────────────────────────────────────────────────────

/// One arena entry: the component plus its scheduling bookkeeping.
pub(crate) struct Slot<M> {
    pub(crate) name:   String,
    pub(crate) model:  M,
    pub(crate) t_last: SimTime,
    pub(crate) t_next: SimTime,
}

impl<M: AtomicModel> Slot<M> {
    /// Absolute next-event time given the transition instant and a
    /// time-advance.  `t + INFINITY` saturates to `SimTime::INFINITY`.
    #[inline]
    pub(crate) fn next_from(t: SimTime, ta: SimDuration) -> SimTime {
        t + ta
    }

    fn reschedule(&mut self, t: SimTime) {
        self.t_last = t;
        self.t_next = Self::next_from(t, self.model.time_advance());
    }
}

// ── RunReport ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StopReason {
    /// The next event lies beyond the horizon.
    Horizon,
    /// Every component is passive; nothing can happen any more.
    Idle,
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct RunReport {
    /// Number of iterations (imminent sets processed) in this call.
    pub iterations: u64,
    /// Time of the last processed iteration.
    pub final_time: SimTime,
    pub reason:     StopReason,
}

// ── Coordinator ───────────────────────────────────────────────────────────────

/// Flat DEVS root coordinator over a closed set of components `M`.
///
/// Create via [`CoordinatorBuilder`][crate::CoordinatorBuilder].
pub struct Coordinator<M: AtomicModel> {
    slots:     Vec<Slot<M>>,
    couplings: CouplingTable,
    queue:     EventQueue,
    now:       SimTime,

    max_instant_iterations: usize,
    /// Iterations already run at `now`.
    at_now: usize,
}

impl<M: AtomicModel> Coordinator<M> {
    pub(crate) fn from_parts(
        slots:                  Vec<Slot<M>>,
        couplings:              CouplingTable,
        queue:                  EventQueue,
        max_instant_iterations: usize,
    ) -> Self {
        Self {
            slots,
            couplings,
            queue,
            now: SimTime::ZERO,
            max_instant_iterations,
            at_now: 0,
        }
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Time of the last processed iteration.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn component_count(&self) -> usize {
        self.slots.len()
    }

    pub fn component(&self, id: ComponentId) -> Option<&M> {
        self.slots.get(id.index()).map(|s| &s.model)
    }

    pub fn name(&self, id: ComponentId) -> Option<&str> {
        self.slots.get(id.index()).map(|s| s.name.as_str())
    }

    /// Scheduled next-event time of `id` (`INFINITY` when passive).
    pub fn next_event_of(&self, id: ComponentId) -> Option<SimTime> {
        self.slots.get(id.index()).map(|s| s.t_next)
    }

    pub fn couplings(&self) -> &CouplingTable {
        &self.couplings
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the next event would lie beyond `horizon`, or until every
    /// component is passive.
    ///
    /// `SimTime::INFINITY` runs to natural idle.  Calls `on_sim_end` once
    /// before returning.
    pub fn run<O: SimObserver<M::Message>>(
        &mut self,
        horizon:  SimTime,
        observer: &mut O,
    ) -> DevsResult<RunReport> {
        info!(horizon = %horizon, components = self.slots.len(), "simulation start");
        let mut iterations = 0u64;

        let reason = loop {
            let Some(t) = self.peek_next_time() else {
                break StopReason::Idle;
            };
            if t > horizon {
                break StopReason::Horizon;
            }
            self.step(t, observer)?;
            iterations += 1;
        };

        observer.on_sim_end(self.now);
        info!(final_time = %self.now, iterations, ?reason, "simulation end");
        Ok(RunReport { iterations, final_time: self.now, reason })
    }

    /// Earliest pending event time with stale entries discarded, or `None`
    /// if every component is passive.
    pub fn peek_next_time(&mut self) -> Option<SimTime> {
        loop {
            let t = self.queue.next_time()?;
            let live = self
                .queue
                .drain_time(t)
                .unwrap_or_default()
                .into_iter()
                .filter(|id| self.slots[id.index()].t_next == t)
                .collect::<Vec<_>>();
            if live.is_empty() {
                continue;
            }
            // Put the live entries back; `step` drains them.
            for id in live {
                self.queue.push(t, id);
            }
            return Some(t);
        }
    }

    // ── Core iteration ────────────────────────────────────────────────────

    /// Process one imminent set at instant `t`.
    fn step<O: SimObserver<M::Message>>(&mut self, t: SimTime, observer: &mut O) -> DevsResult<()> {
        if t == self.now {
            self.at_now += 1;
            if self.at_now > self.max_instant_iterations {
                return Err(DevsError::ZeroTimeLoop { time: t, limit: self.max_instant_iterations });
            }
        } else {
            self.now = t;
            self.at_now = 1;
        }

        // ── Phase 1: imminent set (ascending ComponentId, deduplicated) ───
        let mut imminent: Vec<ComponentId> = self
            .queue
            .drain_time(t)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| self.slots[id.index()].t_next == t)
            .collect();
        imminent.sort_unstable();
        imminent.dedup();
        debug!(time = %t, imminent = imminent.len(), "instant");

        // ── Phase 2: output + routing ─────────────────────────────────────
        //
        // Inboxes are keyed by ComponentId in a BTreeMap so that external
        // transitions run in a fixed order.
        let mut inboxes: BTreeMap<ComponentId, Bag<M::Message>> = BTreeMap::new();
        for &id in &imminent {
            let slot = &self.slots[id.index()];
            for (port, msg) in slot.model.output() {
                observer.on_output(t, &slot.name, port, &msg);
                for endpoint in self.couplings.routes(id, port) {
                    match *endpoint {
                        Endpoint::Input { component, port: input } => {
                            trace!(from = %slot.name, %port, to = %component, %input, "route");
                            inboxes.entry(component).or_default().push(input, msg.clone());
                        }
                        Endpoint::Exit(exit) => {
                            trace!(from = %slot.name, %port, %exit, "exit");
                            observer.on_exit(t, exit, &msg);
                        }
                    }
                }
            }
        }

        // ── Phase 3: internal (and confluent) transitions ─────────────────
        for &id in &imminent {
            let slot = &mut self.slots[id.index()];
            slot.model.internal_transition();
            if let Some(bag) = inboxes.remove(&id) {
                slot.model.external_transition(SimDuration::ZERO, bag);
            }
            slot.reschedule(t);
            self.queue.push(slot.t_next, id);
        }

        // ── Phase 4: external transitions ─────────────────────────────────
        for (id, bag) in inboxes {
            let slot = &mut self.slots[id.index()];
            let elapsed = t.since(slot.t_last);
            slot.model.external_transition(elapsed, bag);
            slot.reschedule(t);
            self.queue.push(slot.t_next, id);
        }

        observer.on_instant_end(t, imminent.len());
        Ok(())
    }
}
