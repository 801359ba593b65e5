//! Unit and integration tests for cf-clinic.

use cf_core::{Patient, PatientId, RiskLevel, SimDuration, SimTime};
use cf_devs::{Bag, Port, SimObserver};
use cf_schedule::ArrivalRecord;

use crate::ClinicConfig;

// ── Shared helpers ────────────────────────────────────────────────────────────

fn secs(n: u64) -> SimDuration {
    SimTime::from_secs(n).since(SimTime::ZERO)
}

fn patient(id: u32, age: u32, risk: RiskLevel, arrival: SimTime) -> Patient {
    Patient::new(PatientId(id), age, risk, arrival)
}

fn bag_on(port: Port, patients: Vec<Patient>) -> Bag<Patient> {
    patients.into_iter().map(|p| (port, p)).collect()
}

fn record(t: u64, age: u32, risk: RiskLevel) -> ArrivalRecord {
    ArrivalRecord { time: SimTime::from_secs(t), age, risk }
}

/// Defaults with an unbounded horizon so runs end at natural idle.
fn run_to_idle() -> ClinicConfig {
    let mut c = ClinicConfig::default();
    c.run.until = SimTime::INFINITY;
    c
}

/// Every message the clinic emits, in emission order.
#[derive(Default)]
struct Recorder {
    outputs: Vec<(SimTime, String, String, Patient)>,
    exits:   Vec<(SimTime, String, Patient)>,
}

impl Recorder {
    fn emitted_by(&self, component: &str) -> impl Iterator<Item = &(SimTime, String, String, Patient)> {
        let component = component.to_owned();
        self.outputs.iter().filter(move |(_, c, _, _)| *c == component)
    }

    fn on_port(&self, port: &str) -> impl Iterator<Item = &(SimTime, String, String, Patient)> {
        let port = port.to_owned();
        self.outputs.iter().filter(move |(_, _, p, _)| *p == port)
    }

    fn exits_to(&self, exit: &str) -> Vec<&Patient> {
        self.exits.iter().filter(|(_, e, _)| e == exit).map(|(_, _, p)| p).collect()
    }

    /// The log as text, one line per emitted message.
    fn lines(&self) -> Vec<String> {
        self.outputs
            .iter()
            .map(|(t, c, port, p)| format!("{t};{c};{port};{p}"))
            .collect()
    }
}

impl SimObserver<Patient> for Recorder {
    fn on_output(&mut self, time: SimTime, component: &str, port: Port, msg: &Patient) {
        self.outputs.push((time, component.to_owned(), port.to_string(), msg.clone()));
    }

    fn on_exit(&mut self, time: SimTime, exit: Port, msg: &Patient) {
        self.exits.push((time, exit.to_string(), msg.clone()));
    }
}

// ── ArrivalSource ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod arrival_tests {
    use super::*;
    use cf_core::PatientStatus;
    use cf_devs::AtomicModel;

    use crate::{ArrivalConfig, ArrivalSource};

    fn stochastic_config(rate: f64, max_patients: u32) -> ArrivalConfig {
        ArrivalConfig { rng_seed: 3, rate, schedule_path: None, max_patients, default_age: 70 }
    }

    #[test]
    fn scheduled_replays_records_in_order() {
        let mut src = ArrivalSource::scheduled(
            vec![record(1, 0, RiskLevel::Unknown), record(3, 85, RiskLevel::High)],
            70,
        );
        assert_eq!(src.time_advance(), secs(1));

        let out = src.output();
        assert_eq!(out.len(), 1);
        let p = &out[0].1;
        assert_eq!(p.id, PatientId(1));
        assert_eq!(p.age, 70, "age 0 takes the default");
        assert_eq!(p.risk, RiskLevel::Unknown);
        assert_eq!(p.arrival, SimTime::from_secs(1));
        assert_eq!(p.status, PatientStatus::Created);

        src.internal_transition();
        assert_eq!(src.now(), SimTime::from_secs(1));
        assert_eq!(src.time_advance(), secs(2));
        let p = src.output().remove(0).1;
        assert_eq!((p.id, p.age, p.risk), (PatientId(2), 85, RiskLevel::High));

        src.internal_transition();
        assert!(src.is_done());
        assert_eq!(src.emitted(), 2);
        assert!(src.time_advance().is_infinite());
        assert!(src.output().is_empty());
    }

    #[test]
    fn empty_schedule_is_idle() {
        let src = ArrivalSource::scheduled(vec![], 70);
        assert!(src.is_done());
        assert!(src.time_advance().is_infinite());
    }

    #[test]
    fn stochastic_first_arrival_at_mean_gap() {
        let src = ArrivalSource::stochastic(&stochastic_config(0.5, 0));
        assert_eq!(src.time_advance(), secs(2));
        let p = src.output().remove(0).1;
        assert_eq!(p.arrival, SimTime::from_secs(2));
        assert_eq!(p.risk, RiskLevel::Unknown);
        assert_eq!(p.age, 70);
    }

    #[test]
    fn unlimited_source_stops_before_the_invalid_id() {
        let mut src = ArrivalSource::stochastic(&stochastic_config(1.0, 0)).starting_at(PatientId(u32::MAX - 2));
        assert_eq!(src.output()[0].1.id, PatientId(u32::MAX - 2));
        src.internal_transition();
        assert!(!src.is_done());
        assert_eq!(src.output()[0].1.id, PatientId(u32::MAX - 1));

        src.internal_transition();
        assert!(src.is_done());
        assert!(src.time_advance().is_infinite());
        assert!(src.output().is_empty());
        assert_eq!(src.emitted(), u32::MAX - 1);

        // Further transitions are no-ops rather than an overflow.
        src.internal_transition();
        assert_eq!(src.emitted(), u32::MAX - 1);
    }

    #[test]
    fn stochastic_stops_at_cap() {
        let mut src = ArrivalSource::stochastic(&stochastic_config(1.0, 2));
        src.internal_transition();
        assert!(!src.is_done());
        assert!(src.time_advance() >= SimDuration::EPSILON);
        src.internal_transition();
        assert!(src.is_done());
        assert_eq!(src.emitted(), 2);
        assert!(src.time_advance().is_infinite());
    }

    #[test]
    fn non_positive_rate_never_fires() {
        for rate in [0.0, -1.0, f64::NAN] {
            let src = ArrivalSource::stochastic(&stochastic_config(rate, 10));
            assert!(src.is_done());
            assert!(src.time_advance().is_infinite());
        }
    }

    #[test]
    fn external_transition_only_moves_the_clock() {
        let mut src = ArrivalSource::scheduled(vec![record(10, 0, RiskLevel::Unknown)], 70);
        src.external_transition(secs(4), Bag::new());
        assert_eq!(src.now(), SimTime::from_secs(4));
        assert_eq!(src.time_advance(), secs(6));
    }
}

// ── Gatekeeper ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod gatekeeper_tests {
    use super::*;
    use cf_core::{Outcome, PatientStatus, ServerIndex};
    use cf_devs::AtomicModel;

    use crate::ports::{IN_PATIENT, IN_RETURN, OUT_ACCEPTED, OUT_REJECTED};
    use crate::{Gatekeeper, GatekeeperConfig, classify_by_age};

    fn gate(p_accept: f64) -> Gatekeeper {
        Gatekeeper::new(&GatekeeperConfig { rng_seed: 7, p_accept, age_high: 80, age_medium: 70 })
    }

    #[test]
    fn age_thresholds() {
        assert_eq!(classify_by_age(80, 80, 70), RiskLevel::High);
        assert_eq!(classify_by_age(95, 80, 70), RiskLevel::High);
        assert_eq!(classify_by_age(79, 80, 70), RiskLevel::Medium);
        assert_eq!(classify_by_age(70, 80, 70), RiskLevel::Medium);
        assert_eq!(classify_by_age(69, 80, 70), RiskLevel::Low);
        assert_eq!(classify_by_age(0, 80, 70), RiskLevel::Low);
    }

    #[test]
    fn accepts_and_classifies_unknown_risk_only() {
        let mut gk = gate(1.0);
        let t = SimTime::ZERO;
        let bag = bag_on(IN_PATIENT, vec![
            patient(1, 85, RiskLevel::Unknown, t),
            patient(2, 75, RiskLevel::Unknown, t),
            patient(3, 30, RiskLevel::Unknown, t),
            patient(4, 90, RiskLevel::Low, t),
        ]);
        gk.external_transition(secs(5), bag);
        assert_eq!(gk.now(), SimTime::from_secs(5));
        assert_eq!(gk.pending(), (4, 0));
        assert_eq!(gk.time_advance(), SimDuration::ZERO);

        let out = gk.output();
        assert!(out.iter().all(|(port, _)| *port == OUT_ACCEPTED));
        assert!(out.iter().all(|(_, p)| p.status == PatientStatus::AwaitingAttention));
        let risks: Vec<_> = out.iter().map(|(_, p)| p.risk).collect();
        assert_eq!(risks, [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low, RiskLevel::Low]);

        gk.internal_transition();
        assert_eq!(gk.pending(), (0, 0));
        assert!(gk.time_advance().is_infinite());
    }

    #[test]
    fn zero_acceptance_rejects_everyone() {
        let mut gk = gate(0.0);
        let bag = bag_on(IN_PATIENT, (1..=5).map(|i| patient(i, 50, RiskLevel::Unknown, SimTime::ZERO)).collect());
        gk.external_transition(SimDuration::ZERO, bag);
        assert_eq!(gk.pending(), (0, 5));
        for (port, p) in gk.output() {
            assert_eq!(port, OUT_REJECTED);
            assert_eq!(p.status, PatientStatus::Finalized);
            assert_eq!(p.outcome, Outcome::Referred);
            assert_eq!(p.risk, RiskLevel::Low);
        }
    }

    #[test]
    fn readmission_resets_cycle_fields() {
        let mut back = patient(9, 82, RiskLevel::High, SimTime::ZERO);
        back.attention_start = SimTime::from_secs(1);
        back.attention_end = SimTime::from_secs(2);
        back.waiting = secs(1);
        back.service = secs(1);
        back.server = ServerIndex(2);
        back.outcome = Outcome::FollowUp;
        back.followups_done = 1;

        let mut gk = gate(1.0);
        gk.external_transition(secs(10), bag_on(IN_RETURN, vec![back]));
        let (port, p) = gk.output().remove(0);

        assert_eq!(port, OUT_ACCEPTED);
        assert_eq!(p.id, PatientId(9));
        assert_eq!(p.risk, RiskLevel::High);
        assert_eq!(p.followups_done, 1);
        assert_eq!(p.arrival, SimTime::from_secs(10));
        assert_eq!(p.attention_start, SimTime::ZERO);
        assert_eq!(p.attention_end, SimTime::ZERO);
        assert_eq!(p.service, SimDuration::ZERO);
        assert!(!p.server.is_valid());
        assert_eq!(p.outcome, Outcome::Unset);
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod dispatcher_tests {
    use super::*;
    use cf_core::ServerIndex;
    use cf_devs::AtomicModel;

    use crate::Dispatcher;
    use crate::ports::{IN_PATIENT, out_server};

    #[test]
    fn round_robin_within_one_bag() {
        let mut d = Dispatcher::new(3);
        let bag = bag_on(IN_PATIENT, (1..=5).map(|i| patient(i, 50, RiskLevel::Low, SimTime::ZERO)).collect());
        d.external_transition(SimDuration::ZERO, bag);
        assert_eq!(d.time_advance(), SimDuration::ZERO);

        let out = d.output();
        let routed: Vec<(Port, u32)> = out.iter().map(|(port, p)| (*port, p.id.0)).collect();
        assert_eq!(routed, [
            (out_server(0), 1),
            (out_server(0), 4),
            (out_server(1), 2),
            (out_server(1), 5),
            (out_server(2), 3),
        ]);
        for (_, p) in &out {
            assert_eq!(p.server, ServerIndex(((p.id.0 - 1) % 3) as u16));
        }
        assert_eq!(d.next_server(), ServerIndex(2));

        d.internal_transition();
        assert!(d.time_advance().is_infinite());
    }

    #[test]
    fn pointer_persists_across_bags() {
        let mut d = Dispatcher::new(2);
        d.external_transition(SimDuration::ZERO, bag_on(IN_PATIENT, vec![patient(1, 50, RiskLevel::Low, SimTime::ZERO)]));
        d.internal_transition();
        d.external_transition(secs(1), bag_on(IN_PATIENT, vec![patient(2, 50, RiskLevel::Low, SimTime::ZERO)]));
        let (port, p) = d.output().remove(0);
        assert_eq!(port, out_server(1));
        assert_eq!(p.server, ServerIndex(1));
        assert_eq!(d.now(), SimTime::from_secs(1));
    }

    #[test]
    fn zero_servers_becomes_one() {
        assert_eq!(Dispatcher::new(0).server_count(), 1);
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod server_tests {
    use super::*;
    use cf_core::{PatientStatus, ServerIndex};
    use cf_devs::AtomicModel;

    use crate::Server;
    use crate::ports::{IN_PATIENT, OUT_PATIENT};

    #[test]
    fn zero_mean_floors_service_and_keeps_fifo() {
        let mut s = Server::new(ServerIndex(0), 0.0, 1);
        assert!(s.time_advance().is_infinite());

        let bag = bag_on(IN_PATIENT, vec![
            patient(1, 50, RiskLevel::Low, SimTime::from_secs(1)),
            patient(2, 50, RiskLevel::Low, SimTime::from_secs(2)),
        ]);
        s.external_transition(secs(4), bag);
        assert!(s.is_busy());
        assert_eq!(s.queue_len(), 1);
        assert_eq!(s.time_advance(), SimDuration::EPSILON);

        let (port, first) = s.output().remove(0);
        assert_eq!(port, OUT_PATIENT);
        assert_eq!(first.id, PatientId(1));
        assert_eq!(first.attention_start, SimTime::from_secs(4));
        assert_eq!(first.attention_end, SimTime(4_000_000_001));
        assert_eq!(first.waiting, secs(3));
        assert_eq!(first.service, SimDuration::EPSILON);
        assert_eq!(first.server, ServerIndex(0));
        assert_eq!(first.status, PatientStatus::AttentionFinished);

        s.internal_transition();
        assert_eq!(s.now(), SimTime(4_000_000_001));
        assert_eq!(s.completed(), 1);
        assert!(s.is_busy(), "next patient starts in the same transition");

        let second = s.output().remove(0).1;
        assert_eq!(second.id, PatientId(2));
        assert_eq!(second.attention_start, SimTime(4_000_000_001));
        assert_eq!(second.waiting, SimDuration(2_000_000_001));

        s.internal_transition();
        assert!(!s.is_busy());
        assert_eq!(s.completed(), 2);
        assert!(s.time_advance().is_infinite());
    }

    #[test]
    fn busy_server_queues_new_arrivals() {
        let mut s = Server::new(ServerIndex(1), 600.0, 42);
        s.external_transition(SimDuration::ZERO, bag_on(IN_PATIENT, vec![patient(1, 50, RiskLevel::Low, SimTime::ZERO)]));
        let ta = s.time_advance();
        assert!(ta > SimDuration::ZERO && !ta.is_infinite());

        s.external_transition(SimDuration::EPSILON, bag_on(IN_PATIENT, vec![patient(2, 50, RiskLevel::Low, SimTime::ZERO)]));
        assert_eq!(s.queue_len(), 1);
        assert_eq!(s.time_advance(), SimDuration(ta.0 - 1), "completion instant is unchanged");
        assert_eq!(s.output()[0].1.id, PatientId(1));
    }
}

// ── FollowUpDecision ──────────────────────────────────────────────────────────

#[cfg(test)]
mod follow_up_tests {
    use super::*;
    use cf_core::{Outcome, PatientStatus};
    use cf_devs::AtomicModel;

    use crate::ports::{IN_PATIENT, OUT_FINALIZED, OUT_RETURN};
    use crate::{FollowUpConfig, FollowUpDecision};

    fn config(base: f64, max_followups: u32, p_referral: f64) -> FollowUpConfig {
        FollowUpConfig {
            rng_seed: 11,
            p_continue_base: base,
            mult_high: 1.0,
            mult_medium: 1.0,
            mult_low: 1.0,
            max_followups,
            p_referral_high: p_referral,
            p_referral_medium: p_referral,
            p_referral_low: p_referral,
        }
    }

    #[test]
    fn certain_return_increments_counter() {
        let mut f = FollowUpDecision::new(&config(1.0, 3, 0.0));
        let mut p = patient(1, 50, RiskLevel::Medium, SimTime::ZERO);
        p.followups_done = 2;
        f.external_transition(secs(1), bag_on(IN_PATIENT, vec![p]));

        let (port, p) = f.output().remove(0);
        assert_eq!(port, OUT_RETURN);
        assert_eq!(p.followups_done, 3);
        assert_eq!(p.outcome, Outcome::FollowUp);
    }

    #[test]
    fn cap_reached_finalizes_without_return() {
        let mut f = FollowUpDecision::new(&config(1.0, 3, 0.0));
        let mut p = patient(1, 50, RiskLevel::High, SimTime::ZERO);
        p.followups_done = 3;
        f.external_transition(secs(1), bag_on(IN_PATIENT, vec![p]));

        let (port, p) = f.output().remove(0);
        assert_eq!(port, OUT_FINALIZED);
        assert_eq!(p.followups_done, 3);
        assert_eq!(p.status, PatientStatus::Finalized);
        assert_eq!(p.outcome, Outcome::Discharged);
    }

    #[test]
    fn certain_referral() {
        let mut f = FollowUpDecision::new(&config(0.0, 3, 1.0));
        f.external_transition(secs(1), bag_on(IN_PATIENT, vec![patient(1, 50, RiskLevel::Low, SimTime::ZERO)]));
        let (port, p) = f.output().remove(0);
        assert_eq!(port, OUT_FINALIZED);
        assert_eq!(p.status, PatientStatus::Referred);
        assert_eq!(p.outcome, Outcome::Referred);
        assert_eq!(p.followups_done, 0);

        f.internal_transition();
        assert!(f.time_advance().is_infinite());
    }

    #[test]
    fn return_probability_is_clamped_per_tier() {
        let mut c = config(0.9, 3, 0.0);
        c.mult_high = 1.2;
        c.mult_low = 0.5;
        let f = FollowUpDecision::new(&c);
        assert_eq!(f.return_probability(RiskLevel::High), 1.0);
        assert_eq!(f.return_probability(RiskLevel::Medium), 0.9);
        assert_eq!(f.return_probability(RiskLevel::Low), 0.45);
        assert_eq!(f.return_probability(RiskLevel::Unknown), 0.9);

        c.p_continue_base = -1.0;
        assert_eq!(FollowUpDecision::new(&c).return_probability(RiskLevel::Low), 0.0);
    }

    #[test]
    fn default_referral_is_higher_for_high_risk() {
        let f = FollowUpDecision::new(&ClinicConfig::default().follow_up);
        assert!(f.referral_probability(RiskLevel::High) > f.referral_probability(RiskLevel::Low));
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config_tests {
    use super::*;
    use cf_schedule::{Params, ScheduleError};

    use crate::ClinicError;

    fn params(pairs: &[(&str, &str)]) -> Params {
        let mut p = Params::new();
        for (k, v) in pairs {
            p.set(*k, *v);
        }
        p
    }

    #[test]
    fn empty_params_give_defaults() {
        let c = ClinicConfig::from_params(&Params::new()).unwrap();
        assert_eq!(c, ClinicConfig::default());
        assert_eq!(c.run.until, SimTime::from_secs(3600));
        assert_eq!(c.run.csv_sep, b';');
        assert_eq!(c.staff.servers, 3);
        assert_eq!(c.follow_up.max_followups, 3);
        assert!(c.arrivals.schedule_path.is_none());
    }

    #[test]
    fn seeds_derive_from_global_seed() {
        let c = ClinicConfig::from_params(&params(&[("simulation.rng_seed", "40")])).unwrap();
        assert_eq!(c.arrivals.rng_seed, 40);
        assert_eq!(c.gatekeeper.rng_seed, 41);
        assert_eq!(c.follow_up.rng_seed, 42);
        assert_eq!(c.staff.rng_seed_base, 1000);

        let c = ClinicConfig::from_params(&params(&[
            ("simulation.rng_seed", "40"),
            ("case_manager.rng_seed", "5"),
        ]))
        .unwrap();
        assert_eq!(c.gatekeeper.rng_seed, 5);
    }

    #[test]
    fn non_positive_horizon_runs_to_idle() {
        let c = ClinicConfig::from_params(&params(&[("simulation.until", "0")])).unwrap();
        assert!(c.run.until.is_infinite());
        let c = ClinicConfig::from_params(&params(&[("simulation.until", "-5")])).unwrap();
        assert!(c.run.until.is_infinite());
    }

    #[test]
    fn degenerate_values_are_normalized() {
        let c = ClinicConfig::from_params(&params(&[
            ("router.doctors", "0"),
            ("consent.p_accept", "1.5"),
            ("adherence.p_referral_alto", "-0.2"),
        ]))
        .unwrap();
        assert_eq!(c.staff.servers, 1);
        assert_eq!(c.gatekeeper.p_accept, 1.0);
        assert_eq!(c.follow_up.p_referral_high, 0.0);
    }

    #[test]
    fn schedule_path_selects_scheduled_mode() {
        let c = ClinicConfig::from_params(&params(&[("arrivals.csv", "input_data/arrivals.csv")])).unwrap();
        assert_eq!(c.arrivals.schedule_path.as_deref(), Some(std::path::Path::new("input_data/arrivals.csv")));
    }

    #[test]
    fn sqlite_log_only_when_path_given() {
        let c = ClinicConfig::from_params(&params(&[("simulation.log_sqlite", "")])).unwrap();
        assert!(c.run.log_sqlite.is_none());
        let c = ClinicConfig::from_params(&params(&[("simulation.log_sqlite", "out/log.db")])).unwrap();
        assert_eq!(c.run.log_sqlite.as_deref(), Some(std::path::Path::new("out/log.db")));
    }

    #[test]
    fn unparseable_value_is_fatal() {
        let err = ClinicConfig::from_params(&params(&[("service.mean", "ten minutes")])).unwrap_err();
        assert!(matches!(err, ClinicError::Schedule(ScheduleError::Param { .. })));
    }

    #[test]
    fn separator_must_be_one_byte() {
        let c = ClinicConfig::from_params(&params(&[("simulation.csv_sep", ",")])).unwrap();
        assert_eq!(c.run.csv_sep, b',');
        let err = ClinicConfig::from_params(&params(&[("simulation.csv_sep", ";;")])).unwrap_err();
        assert!(matches!(err, ClinicError::Config(_)));
    }
}

// ── Whole clinic ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod clinic_tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use cf_devs::StopReason;

    use crate::topology::{DISPATCHER_NAME, GATEKEEPER_NAME, instant_cap, largest_burst, server_name};
    use crate::{Clinic, ClinicError};

    fn run(config: &ClinicConfig, schedule: Option<Vec<ArrivalRecord>>) -> (Clinic, Recorder) {
        let mut clinic = Clinic::build(config, schedule).unwrap();
        let mut rec = Recorder::default();
        let report = clinic.run(&mut rec).unwrap();
        if config.run.until.is_infinite() {
            assert_eq!(report.reason, StopReason::Idle);
        }
        (clinic, rec)
    }

    fn spaced_schedule(n: u64) -> Vec<ArrivalRecord> {
        (1..=n).map(|t| record(t * 10, 0, RiskLevel::Unknown)).collect()
    }

    #[test]
    fn zero_acceptance_rejects_all_at_the_gate() {
        let mut c = run_to_idle();
        c.gatekeeper.p_accept = 0.0;
        c.arrivals.max_patients = 20;
        let (_, rec) = run(&c, None);

        assert_eq!(rec.exits_to("rejected").len(), 20);
        assert!(rec.exits_to("finalized").is_empty());
        assert_eq!(rec.on_port("out_accepted").count(), 0);
        assert_eq!(rec.emitted_by(DISPATCHER_NAME).count(), 0);
    }

    #[test]
    fn no_follow_ups_means_no_returns() {
        let mut c = run_to_idle();
        c.follow_up.max_followups = 0;
        c.follow_up.p_continue_base = 1.0;
        c.arrivals.max_patients = 25;
        let (_, rec) = run(&c, None);

        assert_eq!(rec.on_port("out_return").count(), 0);
        let finalized = rec.exits_to("finalized");
        assert_eq!(finalized.len(), 25);
        assert!(finalized.iter().all(|p| p.followups_done == 0));
    }

    #[test]
    fn single_server_zero_mean_serves_in_arrival_order() {
        let mut c = run_to_idle();
        c.staff.servers = 1;
        c.staff.service_mean = 0.0;
        c.follow_up.max_followups = 0;
        let schedule = vec![
            record(1, 50, RiskLevel::Low),
            record(1, 50, RiskLevel::Low),
            record(1, 50, RiskLevel::Low),
            record(2, 50, RiskLevel::Low),
            record(2, 50, RiskLevel::Low),
        ];
        let (_, rec) = run(&c, Some(schedule));

        let done: Vec<&Patient> = rec.emitted_by(&server_name(0)).map(|(_, _, _, p)| p).collect();
        assert_eq!(done.len(), 5);
        let ids: Vec<u32> = done.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
        assert!(done.iter().all(|p| p.service == SimDuration::EPSILON));
        assert!(done.windows(2).all(|w| w[0].attention_end < w[1].attention_end));
    }

    #[test]
    fn schedule_with_full_acceptance_finalizes_every_record() {
        let mut c = run_to_idle();
        c.gatekeeper.p_accept = 1.0;
        c.follow_up.max_followups = 0;
        let (clinic, rec) = run(&c, Some(spaced_schedule(12)));

        assert!(rec.exits_to("rejected").is_empty());
        let finalized = rec.exits_to("finalized");
        assert_eq!(finalized.len(), 12);
        let ids: BTreeSet<u32> = finalized.iter().map(|p| p.id.0).collect();
        assert_eq!(ids, (1..=12).collect::<BTreeSet<u32>>());
        assert_eq!(clinic.arrival_source().map(|a| a.emitted()), Some(12));
    }

    #[test]
    fn follow_up_cycles_are_bounded() {
        let mut c = run_to_idle();
        c.staff.servers = 2;
        c.follow_up.p_continue_base = 1.0;
        c.follow_up.mult_high = 1.0;
        c.follow_up.mult_medium = 1.0;
        c.follow_up.mult_low = 1.0;
        c.follow_up.max_followups = 3;
        let (_, rec) = run(&c, Some(spaced_schedule(4)));

        assert_eq!(rec.on_port("out_return").count(), 12);
        let finalized = rec.exits_to("finalized");
        assert_eq!(finalized.len(), 4);
        assert!(finalized.iter().all(|p| p.followups_done == 3));

        // Re-admitted patients restart their waiting clock at the gate.
        for (t, _, _, p) in rec.emitted_by(GATEKEEPER_NAME) {
            if p.followups_done > 0 {
                assert_eq!(p.arrival, *t);
            }
        }
    }

    #[test]
    fn every_patient_leaves_exactly_once() {
        let mut c = run_to_idle();
        c.gatekeeper.p_accept = 0.7;
        c.arrivals.max_patients = 60;
        let (_, rec) = run(&c, None);

        let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
        for (_, _, p) in &rec.exits {
            *seen.entry(p.id.0).or_default() += 1;
            assert!(p.status.is_terminal());
            assert!(p.followups_done <= c.follow_up.max_followups);
        }
        assert_eq!(seen.len(), 60);
        assert!(seen.values().all(|&n| n == 1));
    }

    #[test]
    fn service_timestamps_are_ordered() {
        let mut c = run_to_idle();
        c.arrivals.max_patients = 50;
        c.arrivals.rate = 0.02;
        let (_, rec) = run(&c, None);

        let served: Vec<&Patient> = rec
            .outputs
            .iter()
            .filter(|(_, comp, _, _)| comp.starts_with("Server_"))
            .map(|(_, _, _, p)| p)
            .collect();
        assert!(!served.is_empty());
        for p in served {
            assert!(p.arrival <= p.attention_start);
            assert!(p.attention_start < p.attention_end);
            assert_eq!(p.waiting, p.attention_start - p.arrival);
            assert_eq!(p.service, p.attention_end - p.attention_start);
            assert!(p.service > SimDuration::ZERO);
        }
    }

    #[test]
    fn dispatch_is_round_robin_without_returns() {
        let mut c = run_to_idle();
        c.follow_up.max_followups = 0;
        let (_, rec) = run(&c, Some(spaced_schedule(9)));

        let dispatched: Vec<_> = rec.emitted_by(DISPATCHER_NAME).collect();
        assert_eq!(dispatched.len(), 9);
        for (i, (_, _, port, p)) in dispatched.into_iter().enumerate() {
            assert_eq!(*port, format!("out_server_{}", i % 3));
            assert_eq!(p.server.index(), i % 3);
        }
    }

    #[test]
    fn each_server_is_fifo_with_monotone_completions() {
        let mut c = run_to_idle();
        c.arrivals.rate = 0.1;
        c.arrivals.max_patients = 80;
        c.staff.servers = 2;
        let (clinic, rec) = run(&c, None);

        for i in 0..2u16 {
            let lane = format!("out_server_{i}");
            let queued: Vec<u32> = rec.on_port(&lane).map(|(_, _, _, p)| p.id.0).collect();
            let served: Vec<&Patient> = rec.emitted_by(&server_name(i)).map(|(_, _, _, p)| p).collect();
            let served_ids: Vec<u32> = served.iter().map(|p| p.id.0).collect();
            assert_eq!(queued, served_ids, "server {i} reordered its line");
            assert!(served.windows(2).all(|w| w[0].attention_end <= w[1].attention_end));
            assert_eq!(clinic.server(usize::from(i)).map(|s| s.completed()), Some(served.len() as u64));
        }
    }

    #[test]
    fn identical_configs_give_identical_logs() {
        let mut c = run_to_idle();
        c.arrivals.max_patients = 40;
        c.gatekeeper.p_accept = 0.8;
        let (_, a) = run(&c, None);
        let (_, b) = run(&c, None);
        assert!(!a.lines().is_empty());
        assert_eq!(a.lines(), b.lines());

        let mut other = c.clone();
        other.arrivals.rng_seed += 1;
        let (_, d) = run(&other, None);
        assert_ne!(a.lines(), d.lines());
    }

    #[test]
    fn horizon_stops_the_run_early() {
        let mut c = ClinicConfig::default();
        c.run.until = SimTime::from_secs(100);
        c.arrivals.rate = 1.0;
        let mut clinic = Clinic::build(&c, None).unwrap();
        let report = clinic.run(&mut Recorder::default()).unwrap();
        assert_eq!(report.reason, StopReason::Horizon);
        assert!(report.final_time <= SimTime::from_secs(100));
        let coord = clinic.coordinator();
        for id in 0..coord.component_count() {
            let comp = coord.component(cf_devs::ComponentId(id as u32)).unwrap();
            assert!(comp.now() <= report.final_time);
        }
    }

    #[test]
    fn from_config_loads_schedule_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arrivals.csv");
        std::fs::write(&path, "time,age,risk\n5,0,\n1,20,alto\n9,90,bajo\n").unwrap();

        let mut c = run_to_idle();
        c.arrivals.schedule_path = Some(path);
        c.follow_up.max_followups = 0;
        let mut clinic = Clinic::from_config(&c).unwrap();
        let mut rec = Recorder::default();
        clinic.run(&mut rec).unwrap();

        let created: Vec<(u32, u32, RiskLevel)> = rec
            .on_port("out_patient")
            .filter(|(_, comp, _, _)| comp == "ArrivalSource")
            .map(|(_, _, _, p)| (p.id.0, p.age, p.risk))
            .collect();
        assert_eq!(created, [
            (1, 20, RiskLevel::High),
            (2, 70, RiskLevel::Unknown),
            (3, 90, RiskLevel::Low),
        ]);
        assert_eq!(rec.exits_to("finalized").len(), 3);
    }

    #[test]
    fn missing_schedule_file_fails_before_running() {
        let mut c = run_to_idle();
        c.arrivals.schedule_path = Some("/nonexistent/arrivals.csv".into());
        assert!(matches!(Clinic::from_config(&c), Err(ClinicError::Schedule(_))));
    }

    #[test]
    fn largest_burst_counts_equal_times() {
        let records = [
            record(1, 0, RiskLevel::Unknown),
            record(5, 0, RiskLevel::Unknown),
            record(5, 0, RiskLevel::Unknown),
            record(5, 0, RiskLevel::Unknown),
            record(9, 0, RiskLevel::Unknown),
        ];
        assert_eq!(largest_burst(&records), 3);
        assert_eq!(largest_burst(&[]), 0);
        assert_eq!(instant_cap(100, 3), 100);
        assert!(instant_cap(10, 1_000) > 1_000);
    }

    #[test]
    fn simultaneous_burst_above_the_cap_completes() {
        let mut c = run_to_idle();
        c.run.max_instant_iterations = 50;
        c.follow_up.max_followups = 0;
        let schedule: Vec<ArrivalRecord> = (0..200).map(|_| record(5, 0, RiskLevel::Unknown)).collect();
        let (clinic, rec) = run(&c, Some(schedule));

        assert_eq!(clinic.arrival_source().map(|a| a.emitted()), Some(200));
        assert_eq!(rec.exits_to("finalized").len() + rec.exits_to("rejected").len(), 200);
        let ids: BTreeSet<u32> = rec.exits_to("finalized").iter().map(|p| p.id.0).collect();
        assert_eq!(ids.len(), 200);
    }
}
