//! The transport capability.
//!
//! # Design
//! The client never talks to a networking stack directly. It hands a fully
//! formed `HttpRequest` to a `Transport` and gets back either an
//! `HttpResponse` or a `TransportError`. Any non-network outcome, including
//! 4xx and 5xx statuses, is a response and not an error.
//!
//! `TransportError` keeps the underlying cause and exposes two flags,
//! `temporary` and `timeout`. The retry classifier looks at nothing else.

use std::error::Error as StdError;
use std::sync::Arc;

use crate::context::Context;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must be safe to call from several threads at once and
/// must abort in-flight I/O when the context's deadline passes.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        (**self).send(request, ctx)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest, ctx: &Context) -> Result<HttpResponse, TransportError> {
        (**self).send(request, ctx)
    }
}

/// A network-layer failure reported by a `Transport`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{source}")]
pub struct TransportError {
    #[source]
    source: Arc<dyn StdError + Send + Sync>,
    temporary: bool,
    timeout: bool,
}

impl TransportError {
    /// An unclassified failure. These are the ones the retry loop retries.
    pub fn new(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            source: Arc::from(source.into()),
            temporary: false,
            timeout: false,
        }
    }

    pub fn temporary(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            temporary: true,
            ..Self::new(source)
        }
    }

    pub fn timeout(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            timeout: true,
            ..Self::new(source)
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub fn is_timeout(&self) -> bool {
        self.timeout
    }

    /// The wrapped cause.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.source
    }

    /// Downcast the wrapped cause to a concrete error type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}
