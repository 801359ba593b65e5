//! `Server` — one physician with a FIFO waiting line.
//!
//! A server attends at most one patient at a time.  Service durations are
//! exponential with the configured mean, rounded to the nanosecond and
//! floored at [`SimDuration::EPSILON`], so every service takes positive time.
//!
//! When a service completes and the line is not empty, the next patient
//! starts inside the same internal transition: the queue shrinks by one per
//! completion, so a line of `k` patients produces at most `k` completions
//! and never an unbounded cascade.

use std::collections::VecDeque;

use cf_core::{ComponentRng, Patient, PatientStatus, ServerIndex, SimDuration, SimTime};
use cf_devs::{AtomicModel, Bag, Port};
use tracing::trace;

use crate::ports::{IN_PATIENT, OUT_PATIENT};

pub struct Server {
    index:        ServerIndex,
    now:          SimTime,
    queue:        VecDeque<Patient>,
    current:      Option<Patient>,
    /// Absolute completion instant; `INFINITY` while idle.
    finish:       SimTime,
    service_mean: f64,
    rng:          ComponentRng,
    completed:    u64,
}

impl Server {
    pub fn new(index: ServerIndex, service_mean: f64, seed: u64) -> Self {
        Self {
            index,
            now: SimTime::ZERO,
            queue: VecDeque::new(),
            current: None,
            finish: SimTime::INFINITY,
            service_mean,
            rng: ComponentRng::new(seed),
            completed: 0,
        }
    }

    pub fn index(&self) -> ServerIndex {
        self.index
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Patients waiting, not counting the one in service.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Services completed so far.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Begin serving the head of the line if idle.
    fn start_next(&mut self) {
        if self.current.is_some() {
            return;
        }
        let Some(mut patient) = self.queue.pop_front() else {
            return;
        };
        let service = SimDuration::from_secs_f64(self.rng.exponential(self.service_mean))
            .max(SimDuration::EPSILON);

        patient.attention_start = self.now;
        patient.waiting = self.now.since(patient.arrival);
        patient.status = PatientStatus::InAttention;
        patient.server = self.index;
        patient.service = service;

        self.finish = self.now + service;
        trace!(server = %self.index, patient = %patient.id, start = %self.now, %service, "service start");
        self.current = Some(patient);
    }
}

impl AtomicModel for Server {
    type Message = Patient;

    fn time_advance(&self) -> SimDuration {
        if self.current.is_none() {
            return SimDuration::INFINITY;
        }
        // `since` clamps at zero if the clock has passed the completion.
        self.finish.since(self.now)
    }

    fn output(&self) -> Vec<(Port, Patient)> {
        let Some(patient) = &self.current else {
            return vec![];
        };
        let mut done = patient.clone();
        done.attention_end = self.finish;
        done.service = self.finish.since(done.attention_start);
        done.status = PatientStatus::AttentionFinished;
        vec![(OUT_PATIENT, done)]
    }

    fn internal_transition(&mut self) {
        if self.current.take().is_some() {
            self.now = self.finish;
            self.completed += 1;
        }
        self.finish = SimTime::INFINITY;
        self.start_next();
    }

    fn external_transition(&mut self, elapsed: SimDuration, bag: Bag<Patient>) {
        self.now += elapsed;
        for (port, mut patient) in bag {
            if port == IN_PATIENT {
                patient.status = PatientStatus::AwaitingAttention;
                self.queue.push_back(patient);
            }
        }
        self.start_next();
    }
}
