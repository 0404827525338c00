//! Exponential backoff with jitter.
//!
//! Backoff values are plain `f64`s in abstract units; the retry loop scales
//! them by `RetryConfig::backoff_unit` to get a sleep `Duration`.
//!
//! Starting from zero the floored sequence is 1, 2, 4, 8, 16, 16, ... : the
//! integer part doubles until it reaches the ceiling, and every value gets a
//! fresh `[0, 1)` jitter added so that clients recovering from the same outage
//! do not retry in lockstep.

use rand::Rng;

pub const DEFAULT_BACKOFF_CEILING: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    ceiling: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_CEILING)
    }
}

impl Backoff {
    /// Doubling stops once the floored value is at or above `ceiling`.
    pub fn new(ceiling: f64) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    /// Next backoff after `current`, jittered from the thread-local RNG.
    pub fn next(&self, current: f64) -> f64 {
        self.next_with(current, &mut rand::rng())
    }

    /// Next backoff after `current`, jittered from `rng`.
    pub fn next_with<R: Rng>(&self, current: f64, rng: &mut R) -> f64 {
        let jitter: f64 = rng.random();
        if !current.is_finite() || current <= 0.0 {
            return 1.0 + jitter;
        }

        let mut next = current.floor();
        if next < self.ceiling {
            next *= 2.0;
        }
        next + jitter
    }
}
