//! Test doubles for the transport and sleep capabilities.
//!
//! `MockTransport` answers every request through a closure and records what
//! it was sent. `RecordingSleeper` returns immediately and remembers each
//! requested duration. Together they make the retry loop observable without
//! sockets or real time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::context::Context;
use crate::http::{HttpRequest, HttpResponse};
use crate::retry::Outcome;
use crate::sleep::Sleeper;
use crate::transport::{Transport, TransportError};

type Handler = dyn Fn(&HttpRequest) -> Outcome + Send + Sync;

pub struct MockTransport {
    handler: Box<Handler>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&HttpRequest) -> Outcome + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers with `status` and `body` on every call.
    pub fn always(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::new(move |_| Ok(HttpResponse::new(status, body.clone())))
    }

    /// Fails with `error` on every call.
    pub fn failing(error: TransportError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    /// Plays back `outcomes` in order, then repeats the last one.
    pub fn sequence(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let outcomes: VecDeque<Outcome> = outcomes.into_iter().collect();
        let script = Mutex::new(outcomes);
        Self::new(move |_| {
            let mut script = script.lock().unwrap_or_else(|e| e.into_inner());
            match script.len() {
                0 => Err(TransportError::new("mock transport has no scripted outcome")),
                1 => script[0].clone(),
                _ => script.pop_front().unwrap_or_else(|| {
                    Err(TransportError::new("mock transport has no scripted outcome"))
                }),
            }
        })
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest, _ctx: &Context) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        (self.handler)(request)
    }
}

#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration, _ctx: &Context) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/x".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn sequence_repeats_last_outcome() {
        let transport = MockTransport::sequence([
            Ok(HttpResponse::new(503, "")),
            Ok(HttpResponse::new(200, "")),
        ]);
        let ctx = Context::background();
        let statuses: Vec<u16> = (0..3)
            .map(|_| transport.send(&request(), &ctx).unwrap().status)
            .collect();
        assert_eq!(statuses, vec![503, 200, 200]);
        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn recording_sleeper_returns_immediately() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_secs(3600), &Context::background());
        assert_eq!(sleeper.sleeps(), vec![Duration::from_secs(3600)]);
    }
}
