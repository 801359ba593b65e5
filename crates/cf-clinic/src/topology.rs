//! The clinic's coupled model: five kinds of components wired into a single
//! coordinator.
//!
//! ```text
//! ArrivalSource ──► Gatekeeper ──accepted──► Dispatcher ──out_server_i──► Server_i
//!                    ▲     │                                                 │
//!                    │     └─rejected──► exit "rejected"                     ▼
//!                    └────────────── return ◄───────────────────── FollowUpDecision
//!                                                                            │
//!                                                    exit "finalized" ◄──────┘
//! ```

use cf_core::{Patient, ServerIndex, SimTime};
use cf_devs::{ComponentId, Coordinator, CoordinatorBuilder, RunReport, SimObserver};
use cf_schedule::{ArrivalRecord, load_arrivals_csv};
use tracing::info;

use crate::ports::{
    EXIT_FINALIZED, EXIT_REJECTED, IN_PATIENT, IN_RETURN, OUT_ACCEPTED, OUT_FINALIZED, OUT_PATIENT,
    OUT_REJECTED, OUT_RETURN, out_server,
};
use crate::{
    ArrivalSource, ClinicComponent, ClinicConfig, ClinicResult, Dispatcher, FollowUpDecision,
    Gatekeeper, Server,
};

pub const ARRIVALS_NAME:   &str = "ArrivalSource";
pub const GATEKEEPER_NAME: &str = "Gatekeeper";
pub const DISPATCHER_NAME: &str = "Dispatcher";
pub const FOLLOW_UP_NAME:  &str = "FollowUpDecision";

/// Log name of server `i`.
pub fn server_name(i: u16) -> String {
    format!("Server_{i}")
}

/// Components that may act at zero time-advance: the source (once per
/// record), the gatekeeper, the dispatcher and the follow-up decision.
const ZERO_TIME_STAGES: usize = 4;

/// Size of the largest group of records sharing one arrival time.
/// `records` is sorted by time.
pub fn largest_burst(records: &[ArrivalRecord]) -> usize {
    records.chunk_by(|a, b| a.time == b.time).map(<[ArrivalRecord]>::len).max().unwrap_or(0)
}

/// Per-instant iteration cap that still admits a burst of `burst`
/// simultaneous arrivals.  Every record costs one source iteration and the
/// downstream zero-time stages drain in a bounded number more.
pub fn instant_cap(configured: usize, burst: usize) -> usize {
    let needed = burst.saturating_add(1).saturating_mul(ZERO_TIME_STAGES);
    configured.max(needed)
}

/// The assembled clinic, ready to run.
pub struct Clinic {
    coordinator: Coordinator<ClinicComponent>,
    horizon:     SimTime,

    pub arrivals:   ComponentId,
    pub gatekeeper: ComponentId,
    pub dispatcher: ComponentId,
    pub servers:    Vec<ComponentId>,
    pub follow_up:  ComponentId,
}

impl Clinic {
    /// Build from configuration, loading the arrival schedule from disk when
    /// `config.arrivals.schedule_path` is set.
    pub fn from_config(config: &ClinicConfig) -> ClinicResult<Self> {
        let schedule = match &config.arrivals.schedule_path {
            Some(path) => {
                let records = load_arrivals_csv(path)?;
                info!(path = %path.display(), records = records.len(), "arrival schedule loaded");
                Some(records)
            }
            None => None,
        };
        Self::build(config, schedule)
    }

    /// Build with an explicit schedule.  `None` selects stochastic arrivals.
    pub fn build(config: &ClinicConfig, schedule: Option<Vec<ArrivalRecord>>) -> ClinicResult<Self> {
        let mut b = CoordinatorBuilder::new();
        let burst = schedule.as_deref().map_or(0, largest_burst);
        let cap = instant_cap(config.run.max_instant_iterations, burst);
        if cap > config.run.max_instant_iterations {
            info!(burst, cap, "schedule burst exceeds the per-instant cap; raised");
        }
        b.max_instant_iterations(cap);

        let source = match schedule {
            Some(records) => ArrivalSource::scheduled(records, config.arrivals.default_age),
            None => ArrivalSource::stochastic(&config.arrivals),
        };
        let arrivals = b.add_component(ARRIVALS_NAME, ClinicComponent::Arrivals(source));
        let gatekeeper = b.add_component(
            GATEKEEPER_NAME,
            ClinicComponent::Gatekeeper(Gatekeeper::new(&config.gatekeeper)),
        );
        let n = config.staff.servers.max(1);
        let dispatcher = b.add_component(DISPATCHER_NAME, ClinicComponent::Dispatcher(Dispatcher::new(n)));
        let servers: Vec<ComponentId> = (0..n)
            .map(|i| {
                let seed = config.staff.rng_seed_base.wrapping_add(u64::from(i));
                let server = Server::new(ServerIndex(i), config.staff.service_mean, seed);
                b.add_component(server_name(i), ClinicComponent::Server(server))
            })
            .collect();
        let follow_up = b.add_component(
            FOLLOW_UP_NAME,
            ClinicComponent::FollowUp(FollowUpDecision::new(&config.follow_up)),
        );

        b.couple(arrivals, OUT_PATIENT, gatekeeper, IN_PATIENT);
        b.couple(gatekeeper, OUT_ACCEPTED, dispatcher, IN_PATIENT);
        b.couple_exit(gatekeeper, OUT_REJECTED, EXIT_REJECTED);
        for (i, &server) in servers.iter().enumerate() {
            b.couple(dispatcher, out_server(i as u16), server, IN_PATIENT);
            b.couple(server, OUT_PATIENT, follow_up, IN_PATIENT);
        }
        b.couple(follow_up, OUT_RETURN, gatekeeper, IN_RETURN);
        b.couple_exit(follow_up, OUT_FINALIZED, EXIT_FINALIZED);

        Ok(Self {
            coordinator: b.build()?,
            horizon: config.run.until,
            arrivals,
            gatekeeper,
            dispatcher,
            servers,
            follow_up,
        })
    }

    /// Run to the configured horizon (or to natural idle).
    pub fn run<O: SimObserver<Patient>>(&mut self, observer: &mut O) -> ClinicResult<RunReport> {
        Ok(self.coordinator.run(self.horizon, observer)?)
    }

    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    pub fn coordinator(&self) -> &Coordinator<ClinicComponent> {
        &self.coordinator
    }

    pub fn server(&self, i: usize) -> Option<&Server> {
        let id = *self.servers.get(i)?;
        self.coordinator.component(id)?.as_server()
    }

    pub fn arrival_source(&self) -> Option<&ArrivalSource> {
        self.coordinator.component(self.arrivals)?.as_arrivals()
    }
}
