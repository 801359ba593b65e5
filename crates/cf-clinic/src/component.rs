//! `ClinicComponent` — the closed set of clinic components the coordinator
//! runs.

use cf_core::{Patient, SimDuration, SimTime};
use cf_devs::{AtomicModel, Bag, Port};

use crate::{ArrivalSource, Dispatcher, FollowUpDecision, Gatekeeper, Server};

/// One of the five clinic components.  Every call is forwarded to the
/// wrapped model.
pub enum ClinicComponent {
    Arrivals(ArrivalSource),
    Gatekeeper(Gatekeeper),
    Dispatcher(Dispatcher),
    Server(Server),
    FollowUp(FollowUpDecision),
}

macro_rules! delegate {
    ($self:expr, $m:ident => $body:expr) => {
        match $self {
            ClinicComponent::Arrivals($m)   => $body,
            ClinicComponent::Gatekeeper($m) => $body,
            ClinicComponent::Dispatcher($m) => $body,
            ClinicComponent::Server($m)     => $body,
            ClinicComponent::FollowUp($m)   => $body,
        }
    };
}

impl ClinicComponent {
    /// The component's local clock.
    pub fn now(&self) -> SimTime {
        delegate!(self, m => m.now())
    }

    pub fn as_arrivals(&self) -> Option<&ArrivalSource> {
        match self {
            ClinicComponent::Arrivals(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_server(&self) -> Option<&Server> {
        match self {
            ClinicComponent::Server(m) => Some(m),
            _ => None,
        }
    }
}

impl AtomicModel for ClinicComponent {
    type Message = Patient;

    fn time_advance(&self) -> SimDuration {
        delegate!(self, m => m.time_advance())
    }

    fn output(&self) -> Vec<(Port, Patient)> {
        delegate!(self, m => m.output())
    }

    fn internal_transition(&mut self) {
        delegate!(self, m => m.internal_transition())
    }

    fn external_transition(&mut self, elapsed: SimDuration, bag: Bag<Patient>) {
        delegate!(self, m => m.external_transition(elapsed, bag))
    }
}
