//! Fluent builder for constructing a [`Coordinator`].

use cf_core::SimTime;

use crate::coordinator::Slot;
use crate::{
    AtomicModel, ComponentId, Coordinator, Coupling, CouplingTable, DevsError, DevsResult,
    Endpoint, EventQueue, Port,
};

/// Default cap on iterations at one simulated instant.
pub const DEFAULT_MAX_INSTANT_ITERATIONS: usize = 100_000;

/// Fluent builder for [`Coordinator<M>`].
///
/// # Example
///
/// ```rust,ignore
/// let mut b = CoordinatorBuilder::new();
/// let src  = b.add_component("source", source);
/// let sink = b.add_component("sink", sink);
/// b.couple(src, Port::new("out"), sink, Port::new("in"));
/// b.couple_exit(sink, Port::new("done"), Port::new("out_done"));
/// let mut coord = b.build()?;
/// coord.run(SimTime::from_secs(3600), &mut NoopObserver)?;
/// ```
pub struct CoordinatorBuilder<M: AtomicModel> {
    components:             Vec<(String, M)>,
    couplings:              Vec<Coupling>,
    max_instant_iterations: usize,
}

impl<M: AtomicModel> Default for CoordinatorBuilder<M> {
    fn default() -> Self {
        Self {
            components:             Vec::new(),
            couplings:              Vec::new(),
            max_instant_iterations: DEFAULT_MAX_INSTANT_ITERATIONS,
        }
    }
}

impl<M: AtomicModel> CoordinatorBuilder<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component and return its arena index.
    pub fn add_component(&mut self, name: impl Into<String>, model: M) -> ComponentId {
        let id = ComponentId(self.components.len() as u32);
        self.components.push((name.into(), model));
        id
    }

    /// Connect `from`'s output port to `to`'s input port.
    pub fn couple(&mut self, from: ComponentId, out: Port, to: ComponentId, input: Port) -> &mut Self {
        self.couplings.push(Coupling {
            from,
            port: out,
            to: Endpoint::Input { component: to, port: input },
        });
        self
    }

    /// Connect `from`'s output port to a top-level exit.
    pub fn couple_exit(&mut self, from: ComponentId, out: Port, exit: Port) -> &mut Self {
        self.couplings.push(Coupling { from, port: out, to: Endpoint::Exit(exit) });
        self
    }

    /// Cap on iterations at a single instant (guards zero-time cascades).
    pub fn max_instant_iterations(&mut self, limit: usize) -> &mut Self {
        self.max_instant_iterations = limit.max(1);
        self
    }

    /// Validate the topology, schedule every component at t = 0, and return
    /// a ready-to-run [`Coordinator`].
    pub fn build(self) -> DevsResult<Coordinator<M>> {
        let count = self.components.len();

        // ── Validate couplings ────────────────────────────────────────────
        let mut table = CouplingTable::new();
        for c in self.couplings {
            if c.from.index() >= count {
                return Err(DevsError::UnknownComponent(c.from));
            }
            if let Endpoint::Input { component, .. } = c.to {
                if component.index() >= count {
                    return Err(DevsError::UnknownComponent(component));
                }
            }
            if !table.insert(c) {
                return Err(DevsError::DuplicateCoupling { from: c.from, port: c.port, to: c.to });
            }
        }

        // ── Initial schedule ──────────────────────────────────────────────
        let mut queue = EventQueue::new();
        let slots: Vec<Slot<M>> = self
            .components
            .into_iter()
            .enumerate()
            .map(|(i, (name, model))| {
                let t_next = Slot::<M>::next_from(SimTime::ZERO, model.time_advance());
                queue.push(t_next, ComponentId(i as u32));
                Slot { name, model, t_last: SimTime::ZERO, t_next }
            })
            .collect();

        Ok(Coordinator::from_parts(slots, table, queue, self.max_instant_iterations))
    }
}
