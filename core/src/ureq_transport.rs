//! Default `Transport` backed by a pooled `ureq::Agent`.
//!
//! Status codes are never turned into errors here: the agent is built with
//! `http_status_as_error(false)` so 4xx/5xx responses come back as data and
//! the client decides what they mean.

use std::io;
use std::time::Duration;

use ureq::{Agent, RequestBuilder};

use crate::config::TransportConfig;
use crate::context::Context;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportError};

/// Pooled blocking transport.
///
/// The context's deadline bounds each request through a per-request global
/// timeout. A cancelled context is refused before dispatch, but
/// cancellation is not observed once a request is in flight: ureq
/// has no hook to abort a blocking read, so the request runs until it
/// completes or the deadline fires.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .max_idle_connections(config.max_idle_connections)
            .max_idle_connections_per_host(config.max_idle_connections_per_host)
            .max_idle_age(config.idle_timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        if ctx.is_cancelled() {
            return Err(TransportError::temporary(io::Error::new(
                io::ErrorKind::Interrupted,
                "cancelled before dispatch",
            )));
        }
        let remaining = ctx.remaining();
        if remaining == Some(Duration::ZERO) {
            return Err(TransportError::timeout(io::Error::new(
                io::ErrorKind::TimedOut,
                "deadline exceeded before dispatch",
            )));
        }

        let url = request.url.as_str();
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => prepare(self.agent.get(url), request, remaining).call(),
            (HttpMethod::Delete, _) => prepare(self.agent.delete(url), request, remaining).call(),
            (HttpMethod::Post, Some(body)) => {
                prepare(self.agent.post(url), request, remaining).send(body)
            }
            (HttpMethod::Post, None) => {
                prepare(self.agent.post(url), request, remaining).send_empty()
            }
        };

        let mut response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response.body_mut().read_to_vec().map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn prepare<B>(
    mut builder: RequestBuilder<B>,
    request: &HttpRequest,
    remaining: Option<Duration>,
) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match remaining {
        Some(timeout) => builder.config().timeout_global(Some(timeout)).build(),
        None => builder,
    }
}

/// Map a ureq failure onto the temporary/timeout flags.
fn classify(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => Some(io::ErrorKind::TimedOut),
        ureq::Error::Io(io_err) => Some(io_err.kind()),
        _ => None,
    };
    match kind {
        Some(io::ErrorKind::TimedOut) => TransportError::timeout(err),
        Some(
            io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted,
        ) => TransportError::temporary(err),
        _ => TransportError::new(err),
    }
}
