//! The sleep capability used between retry attempts.

use std::time::{Duration, Instant};

use crate::context::Context;

/// Upper bound on how long `ThreadSleeper` blocks before looking at the
/// context again.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Suspends the calling thread between retry attempts.
///
/// Implementations should return early once `ctx` is cancelled or its
/// deadline passes.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration, ctx: &Context);
}

/// Blocks the current thread for the requested duration, waking early when
/// the context is done.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, ctx: &Context) {
        let until = Instant::now() + duration;
        let until = ctx.deadline().map_or(until, |deadline| deadline.min(until));
        loop {
            if ctx.is_cancelled() {
                return;
            }
            let left = until.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return;
            }
            std::thread::sleep(left.min(CANCEL_POLL_INTERVAL));
        }
    }
}

/// Returns immediately. Makes retries instantaneous in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

impl Sleeper for NoopSleeper {
    fn sleep(&self, _duration: Duration, _ctx: &Context) {}
}
