//! Port and exit names shared by the components and the topology.
//!
//! Every component receives patients on [`IN_PATIENT`]; the gatekeeper also
//! listens on [`IN_RETURN`] for the follow-up loop.  The dispatcher has one
//! replicated output, `out_server_<i>`, per server.

use cf_devs::Port;

pub const IN_PATIENT: Port = Port::new("in_patient");
pub const IN_RETURN:  Port = Port::new("in_return");

pub const OUT_PATIENT:   Port = Port::new("out_patient");
pub const OUT_ACCEPTED:  Port = Port::new("out_accepted");
pub const OUT_REJECTED:  Port = Port::new("out_rejected");
pub const OUT_RETURN:    Port = Port::new("out_return");
pub const OUT_FINALIZED: Port = Port::new("out_finalized");

/// Base name of the dispatcher's per-server lanes.
pub const OUT_SERVER: &str = "out_server";

#[inline]
pub fn out_server(index: u16) -> Port {
    Port::lane(OUT_SERVER, index)
}

// ── Top-level exits ───────────────────────────────────────────────────────────

pub const EXIT_REJECTED:  Port = Port::new("rejected");
pub const EXIT_FINALIZED: Port = Port::new("finalized");
