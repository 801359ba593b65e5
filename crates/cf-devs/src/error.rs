use cf_core::SimTime;
use thiserror::Error;

use crate::{ComponentId, Endpoint, Port};

#[derive(Debug, Error)]
pub enum DevsError {
    #[error("coupling references unknown component {0}")]
    UnknownComponent(ComponentId),

    #[error("duplicate coupling {from}:{port} -> {to}")]
    DuplicateCoupling {
        from: ComponentId,
        port: Port,
        to:   Endpoint,
    },

    #[error("more than {limit} iterations at instant {time} without time advancing")]
    ZeroTimeLoop { time: SimTime, limit: usize },
}

pub type DevsResult<T> = Result<T, DevsError>;
