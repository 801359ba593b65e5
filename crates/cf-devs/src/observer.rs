//! Observer trait for event logging and progress reporting.

use cf_core::SimTime;

use crate::Port;

/// Callbacks invoked by [`Coordinator::run`][crate::Coordinator::run].
///
/// All methods have default no-op implementations so implementors only
/// override what they care about.
///
/// # Example: exit counter
///
/// ```rust,ignore
/// struct ExitCounter(usize);
///
/// impl<M> SimObserver<M> for ExitCounter {
///     fn on_exit(&mut self, _t: SimTime, _port: Port, _msg: &M) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver<M> {
    /// Called once per message a component emits, before routing.
    fn on_output(&mut self, _time: SimTime, _component: &str, _port: Port, _msg: &M) {}

    /// Called once per message that reaches a top-level exit.
    fn on_exit(&mut self, _time: SimTime, _exit: Port, _msg: &M) {}

    /// Called after every iteration; `imminent` is the number of components
    /// whose internal event fired.
    fn on_instant_end(&mut self, _time: SimTime, _imminent: usize) {}

    /// Called once when the run stops.
    fn on_sim_end(&mut self, _final_time: SimTime) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl<M> SimObserver<M> for NoopObserver {}

/// Two observers driven side by side, `.0` first.
impl<M, A: SimObserver<M>, B: SimObserver<M>> SimObserver<M> for (A, B) {
    fn on_output(&mut self, time: SimTime, component: &str, port: Port, msg: &M) {
        self.0.on_output(time, component, port, msg);
        self.1.on_output(time, component, port, msg);
    }

    fn on_exit(&mut self, time: SimTime, exit: Port, msg: &M) {
        self.0.on_exit(time, exit, msg);
        self.1.on_exit(time, exit, msg);
    }

    fn on_instant_end(&mut self, time: SimTime, imminent: usize) {
        self.0.on_instant_end(time, imminent);
        self.1.on_instant_end(time, imminent);
    }

    fn on_sim_end(&mut self, final_time: SimTime) {
        self.0.on_sim_end(final_time);
        self.1.on_sim_end(final_time);
    }
}
