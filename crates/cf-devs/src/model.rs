//! The `AtomicModel` trait and the port/bag types it exchanges.

use std::fmt;

use cf_core::SimDuration;

// ── Port ──────────────────────────────────────────────────────────────────────

/// A named input or output port.
///
/// Replicated ports (one per server, say) share a `name` and differ by
/// `lane`.  Ports are plain values; a component matches on them to tell its
/// input channels apart.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Port {
    pub name: &'static str,
    pub lane: Option<u16>,
}

impl Port {
    pub const fn new(name: &'static str) -> Self {
        Self { name, lane: None }
    }

    pub const fn lane(name: &'static str, lane: u16) -> Self {
        Self { name, lane: Some(lane) }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lane {
            None => f.write_str(self.name),
            Some(i) => write!(f, "{}_{}", self.name, i),
        }
    }
}

// ── Bag ───────────────────────────────────────────────────────────────────────

/// All messages delivered to one component at one simulated instant.
///
/// A bag is a multiset: components must not rely on the relative order of
/// messages that came from different upstream components.  The coordinator
/// does keep a deterministic order (upstream `ComponentId`, then emission
/// order) so that replays are identical, and messages from a single upstream
/// port keep their emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bag<M> {
    items: Vec<(Port, M)>,
}

impl<M> Default for Bag<M> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<M> Bag<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, port: Port, msg: M) {
        self.items.push((port, msg));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Port, M)> {
        self.items.iter()
    }

    /// Messages that arrived on `port`, by reference.
    pub fn on(&self, port: Port) -> impl Iterator<Item = &M> {
        self.items
            .iter()
            .filter(move |(p, _)| *p == port)
            .map(|(_, m)| m)
    }
}

impl<M> IntoIterator for Bag<M> {
    type Item = (Port, M);
    type IntoIter = std::vec::IntoIter<(Port, M)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<M> FromIterator<(Port, M)> for Bag<M> {
    fn from_iter<I: IntoIterator<Item = (Port, M)>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}

// ── AtomicModel ───────────────────────────────────────────────────────────────

/// A DEVS atomic component.
///
/// The coordinator guarantees the calling protocol:
///
/// - `output` is called only when the component is imminent (its
///   time-advance has elapsed), and is always followed immediately by
///   `internal_transition` at zero additional elapsed time.
/// - `external_transition` receives *every* message addressed to the
///   component at an instant in a single bag; it is never split.
/// - When a component is both imminent and receives input, it runs
///   `internal_transition` and then `external_transition(ZERO, bag)`.
///
/// Implementations own all their state (including any RNG) and never hold
/// references to other components.
pub trait AtomicModel {
    type Message: Clone;

    /// How long the component may stay idle before its next internal event.
    /// [`SimDuration::INFINITY`] means passive.
    fn time_advance(&self) -> SimDuration;

    /// Messages emitted at the internal event, in emission order.
    fn output(&self) -> Vec<(Port, Self::Message)>;

    fn internal_transition(&mut self);

    /// React to `bag` after `elapsed` time since the last transition.
    fn external_transition(&mut self, elapsed: SimDuration, bag: Bag<Self::Message>);
}
