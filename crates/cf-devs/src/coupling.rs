//! Component identifiers and the coupling (edge) table.

use std::collections::BTreeMap;
use std::fmt;

use crate::Port;

/// Index of a component in the coordinator's arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ComponentId(pub u32);

impl ComponentId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// Where an output port's messages go.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Endpoint {
    /// Another component's input port.
    Input { component: ComponentId, port: Port },
    /// An output port of the top-level model; messages routed here leave
    /// the simulation.
    Exit(Port),
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Input { component, port } => write!(f, "{component}:{port}"),
            Endpoint::Exit(port) => write!(f, "exit:{port}"),
        }
    }
}

/// One directed edge.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Coupling {
    pub from: ComponentId,
    pub port: Port,
    pub to:   Endpoint,
}

/// Edge table keyed by `(source component, output port)`.
///
/// One output port may fan out to several endpoints; several output ports
/// may target the same input port (the coordinator coalesces them into one
/// bag).  Fan-out order is insertion order.
#[derive(Debug, Default)]
pub struct CouplingTable {
    routes: BTreeMap<(ComponentId, Port), Vec<Endpoint>>,
    edges:  usize,
}

impl CouplingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge.  Returns `false` (and leaves the table unchanged) if the
    /// identical edge already exists.
    pub fn insert(&mut self, coupling: Coupling) -> bool {
        let targets = self.routes.entry((coupling.from, coupling.port)).or_default();
        if targets.contains(&coupling.to) {
            return false;
        }
        targets.push(coupling.to);
        self.edges += 1;
        true
    }

    /// Endpoints fed by `from`'s output `port` (empty if unconnected).
    pub fn routes(&self, from: ComponentId, port: Port) -> &[Endpoint] {
        self.routes
            .get(&(from, port))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges == 0
    }
}
