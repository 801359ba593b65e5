//! `Dispatcher` — round-robin assignment of accepted patients to servers.

use cf_core::{Patient, PatientStatus, ServerIndex, SimDuration, SimTime};
use cf_devs::{AtomicModel, Bag, Port};

use crate::ports::{IN_PATIENT, out_server};

/// Sends the i-th accepted patient (counting from 0) to server `i mod N`.
pub struct Dispatcher {
    now:     SimTime,
    next:    u16,
    buffers: Vec<Vec<Patient>>,
}

impl Dispatcher {
    /// `servers` is clamped to at least 1.
    pub fn new(servers: u16) -> Self {
        Self {
            now:     SimTime::ZERO,
            next:    0,
            buffers: vec![Vec::new(); usize::from(servers.max(1))],
        }
    }

    /// Local clock, advanced by every transition.
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn server_count(&self) -> u16 {
        self.buffers.len() as u16
    }

    /// Server that the next accepted patient will be sent to.
    pub fn next_server(&self) -> ServerIndex {
        ServerIndex(self.next)
    }
}

impl AtomicModel for Dispatcher {
    type Message = Patient;

    fn time_advance(&self) -> SimDuration {
        if self.buffers.iter().all(Vec::is_empty) {
            SimDuration::INFINITY
        } else {
            SimDuration::ZERO
        }
    }

    fn output(&self) -> Vec<(Port, Patient)> {
        self.buffers
            .iter()
            .enumerate()
            .flat_map(|(i, buf)| buf.iter().map(move |p| (out_server(i as u16), p.clone())))
            .collect()
    }

    fn internal_transition(&mut self) {
        for buf in &mut self.buffers {
            buf.clear();
        }
    }

    fn external_transition(&mut self, elapsed: SimDuration, bag: Bag<Patient>) {
        self.now += elapsed;
        let n = self.server_count();
        for (port, mut patient) in bag {
            if port != IN_PATIENT {
                continue;
            }
            let idx = self.next;
            patient.server = ServerIndex(idx);
            patient.status = PatientStatus::AwaitingAttention;
            self.buffers[usize::from(idx)].push(patient);
            self.next = (idx + 1) % n;
        }
    }
}
