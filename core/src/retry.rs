//! Retry classification and the bounded retry loop.
//!
//! # Design
//! Classification is a pure function of the outcome: a response is retried
//! when its status is one of 500, 502, 503 or 504, and a transport failure
//! is retried only when the transport flagged it neither temporary nor
//! timeout. The classifier does not know which operation is running; only
//! idempotent operations are routed through `send_with_retry` at all.
//!
//! `RetryState` lives for a single call. The configuration is read once when
//! the loop starts and is never mutated.

use std::time::Duration;

use tracing::{debug, warn};

use crate::backoff::{Backoff, DEFAULT_BACKOFF_CEILING};
use crate::context::Context;
use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};
use crate::sleep::Sleeper;
use crate::transport::{Transport, TransportError};

/// Statuses presumed to be transient server-side failures.
pub const RETRIABLE_STATUSES: [u16; 4] = [500, 502, 503, 504];

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Retry settings, fixed when the client is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Upper bound on transport calls per operation.
    pub max_attempts: u32,
    /// Backoff value the first sleep is derived from.
    pub initial_backoff: f64,
    /// Doubling stops once the floored backoff reaches this value.
    pub backoff_ceiling: f64,
    /// Duration of one backoff unit.
    pub backoff_unit: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: 0.0,
            backoff_ceiling: DEFAULT_BACKOFF_CEILING,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Values below one are treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: f64) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_backoff_ceiling(mut self, ceiling: f64) -> Self {
        self.backoff_ceiling = ceiling;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.backoff_ceiling)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// The result of a single transport call.
pub type Outcome = Result<HttpResponse, TransportError>;

pub fn should_retry_status(status: u16) -> bool {
    RETRIABLE_STATUSES.contains(&status)
}

/// Failures explicitly flagged temporary or timeout are surfaced at once;
/// only unflagged failures are retried.
pub fn should_retry_transport(err: &TransportError) -> bool {
    !(err.is_temporary() || err.is_timeout())
}

pub fn should_retry(outcome: &Outcome) -> bool {
    match outcome {
        Ok(response) => should_retry_status(response.status),
        Err(err) => should_retry_transport(err),
    }
}

/// Per-call retry bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryState {
    attempt: u32,
    backoff: f64,
}

impl RetryState {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            backoff: config.backoff().next(config.initial_backoff),
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn backoff(&self) -> f64 {
        self.backoff
    }

    /// Duration of the next sleep. Saturates at `Duration::MAX` when the
    /// scaled backoff does not fit.
    pub fn sleep_duration(&self, config: &RetryConfig) -> Duration {
        let secs = config.backoff_unit.as_secs_f64() * self.backoff;
        Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        })
    }

    /// Record a finished attempt and move the backoff forward.
    pub fn advance(&mut self, config: &RetryConfig) {
        self.attempt += 1;
        self.backoff = config.backoff().next(self.backoff);
    }
}

/// Send `request` until it yields a non-retriable outcome or the attempt
/// ceiling is reached.
///
/// Every retriable outcome is followed by a sleep, including the last one.
/// The sleep never outlasts the context's deadline and ends early on
/// cancellation; the next attempt is then refused by `Context::check`.
/// When the ceiling is reached the last outcome is returned as-is: a
/// retriable status still comes back as `Ok` for the caller to unify.
pub fn send_with_retry(
    transport: &dyn Transport,
    sleeper: &dyn Sleeper,
    config: &RetryConfig,
    ctx: &Context,
    request: &HttpRequest,
) -> Result<HttpResponse, Error> {
    let mut state = RetryState::new(config);
    let max_attempts = config.attempts();

    loop {
        ctx.check()?;

        let outcome = transport.send(request, ctx);
        if !should_retry(&outcome) {
            return outcome.map_err(Error::from);
        }

        let full = state.sleep_duration(config);
        let sleep = ctx.remaining().map_or(full, |left| full.min(left));
        match &outcome {
            Ok(response) => debug!(
                method = request.method.as_str(),
                url = %request.url,
                attempt = state.attempt() + 1,
                status = response.status,
                ?sleep,
                "retriable status"
            ),
            Err(err) => debug!(
                method = request.method.as_str(),
                url = %request.url,
                attempt = state.attempt() + 1,
                error = %err,
                ?sleep,
                "retriable transport failure"
            ),
        }

        sleeper.sleep(sleep, ctx);
        state.advance(config);

        if state.attempt() >= max_attempts {
            warn!(
                method = request.method.as_str(),
                url = %request.url,
                attempts = state.attempt(),
                "giving up after reaching the attempt limit"
            );
            return outcome.map_err(Error::from);
        }
    }
}
