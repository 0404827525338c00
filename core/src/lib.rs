//! Synchronous client for the accounts API.
//!
//! # Overview
//! `AccountsClient` creates, fetches and deletes accounts. Fetch and delete
//! are idempotent and retried on transient failures with exponential
//! backoff and jitter; create is sent exactly once.
//!
//! # Design
//! - The network and the clock are capabilities: `Transport` executes a
//!   plain-data `HttpRequest`, `Sleeper` waits between attempts. Both are
//!   injected at construction, so the retry engine runs in tests without
//!   sockets or real time (see `testing`).
//! - `backoff` and `retry` are pure: the next wait, and whether an outcome
//!   is worth another attempt, depend only on their inputs.
//! - Every failure is an `Error`. Responses the server rejected are unified
//!   into `ApiError`, a value compared by field equality.
//! - Configuration is explicit and per client; nothing is process-wide.

pub mod backoff;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod retry;
pub mod sleep;
pub mod testing;
pub mod transport;
pub mod types;
pub mod ureq_transport;

pub use backoff::Backoff;
pub use client::AccountsClient;
pub use config::{ClientConfig, TransportConfig};
pub use context::Context;
pub use error::{ApiError, Error};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Operation};
pub use retry::{send_with_retry, RetryConfig};
pub use sleep::{NoopSleeper, Sleeper, ThreadSleeper};
pub use transport::{Transport, TransportError};
pub use types::{Account, AccountAttributes, AccountCreate, Envelope};
pub use ureq_transport::UreqTransport;
