//! Deterministic per-component RNG wrapper.
//!
//! # Determinism strategy
//!
//! Every atomic component that makes stochastic decisions owns exactly one
//! `ComponentRng`, seeded from configuration when the component is built.
//! Components never share generators, so the draw sequence each one sees
//! depends only on its own seed and on the order in which it processes
//! patients.  Replaying a configuration therefore replays every draw.
//!
//! Each helper below consumes a fixed number of raw samples (one) so that
//! the number of draws per decision is part of the component's contract.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Owned, seeded generator for one atomic component.
///
/// Not `Clone`: each stream has exactly one owner.
#[derive(Debug)]
pub struct ComponentRng(SmallRng);

impl ComponentRng {
    pub fn new(seed: u64) -> Self {
        ComponentRng(SmallRng::seed_from_u64(seed))
    }

    /// One uniform sample in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    ///
    /// Draws exactly one uniform sample `u` and returns `u < p`, so `p = 0`
    /// is never true and `p = 1` is always true.
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.uniform() < p.clamp(0.0, 1.0)
    }

    /// One exponential sample with the given mean (inverse-transform method).
    ///
    /// A non-positive or non-finite mean yields `0.0` without consuming a
    /// sample.  The result may be exactly zero; callers that need a strictly
    /// positive duration must floor it themselves.
    pub fn exponential(&mut self, mean: f64) -> f64 {
        if !(mean > 0.0 && mean.is_finite()) {
            return 0.0;
        }
        let u = self.uniform();
        // 1 - u lies in (0, 1], so the log is finite.
        -(1.0 - u).ln() * mean
    }
}
