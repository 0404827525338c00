//! The accounts resource client.
//!
//! # Design
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`, so
//! callers that run their own I/O can use the client without its transport.
//! `create`, `fetch` and `delete` glue the two halves together:
//!
//! - `create` dispatches exactly once. Creation is not idempotent and a blind
//!   retry could create a duplicate upstream.
//! - `fetch` and `delete` go through `send_with_retry`.
//!
//! The client holds no per-call state. Retry state is allocated inside each
//! call, so one client can be shared across threads.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use tracing::trace;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::{ApiError, Error};
use crate::http::{
    HttpRequest, HttpResponse, Operation, HEADER_ACCEPT, HEADER_CONTENT_TYPE, HEADER_DATE,
    JSON_API_CONTENT_TYPE,
};
use crate::retry::{send_with_retry, RetryConfig};
use crate::sleep::{Sleeper, ThreadSleeper};
use crate::transport::Transport;
use crate::types::{Account, AccountCreate, Envelope};
use crate::ureq_transport::UreqTransport;

/// Path of the accounts collection relative to the base URL.
pub const ACCOUNTS_PATH: &str = "v1/organisation/accounts";

/// Client for the accounts resource.
#[derive(Clone)]
pub struct AccountsClient {
    base_url: String,
    retry: RetryConfig,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for AccountsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountsClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl AccountsClient {
    /// A client using the pooled ureq transport and real sleeps.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let transport = Arc::new(UreqTransport::new(&config.transport));
        Self::with_capabilities(config, transport, Arc::new(ThreadSleeper))
    }

    /// A client using the given transport and sleeper.
    pub fn with_capabilities(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: config.retry,
            transport,
            sleeper,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Create an account. Sent once, never retried.
    pub fn create(&self, ctx: &Context, input: &AccountCreate) -> Result<Account, Error> {
        let request = self.build_create_account(input)?;
        ctx.check()?;
        trace!(url = %request.url, "creating account");
        let response = self.transport.send(&request, ctx)?;
        self.parse_create_account(response)
    }

    /// Fetch an account by id, retrying transient failures.
    pub fn fetch(&self, ctx: &Context, id: Uuid) -> Result<Account, Error> {
        let request = self.build_fetch_account(id)?;
        trace!(url = %request.url, "fetching account");
        let response = self.send_idempotent(ctx, &request)?;
        self.parse_fetch_account(response)
    }

    /// Delete an account at `version`, retrying transient failures. A version
    /// mismatch is reported by the server as a 409 and is not retried.
    pub fn delete(&self, ctx: &Context, id: Uuid, version: i64) -> Result<(), Error> {
        let request = self.build_delete_account(id, version)?;
        trace!(url = %request.url, "deleting account");
        let response = self.send_idempotent(ctx, &request)?;
        self.parse_delete_account(response)
    }

    fn send_idempotent(&self, ctx: &Context, request: &HttpRequest) -> Result<HttpResponse, Error> {
        send_with_retry(
            self.transport.as_ref(),
            self.sleeper.as_ref(),
            &self.retry,
            ctx,
            request,
        )
    }

    pub fn build_create_account(&self, input: &AccountCreate) -> Result<HttpRequest, Error> {
        let body = serde_json::to_vec(&Envelope { data: input }).map_err(Error::Encode)?;
        Ok(HttpRequest {
            method: Operation::Create.method(),
            url: self.collection_url(),
            headers: request_headers(Operation::Create),
            body: Some(body),
        })
    }

    pub fn build_fetch_account(&self, id: Uuid) -> Result<HttpRequest, Error> {
        require_id(id)?;
        Ok(HttpRequest {
            method: Operation::Fetch.method(),
            url: format!("{}/{id}", self.collection_url()),
            headers: request_headers(Operation::Fetch),
            body: None,
        })
    }

    pub fn build_delete_account(&self, id: Uuid, version: i64) -> Result<HttpRequest, Error> {
        require_id(id)?;
        if version < 0 {
            return Err(Error::Validation(format!(
                "account version must not be negative, got {version}"
            )));
        }
        Ok(HttpRequest {
            method: Operation::Delete.method(),
            url: format!("{}/{id}?version={version}", self.collection_url()),
            headers: request_headers(Operation::Delete),
            body: None,
        })
    }

    pub fn parse_create_account(&self, response: HttpResponse) -> Result<Account, Error> {
        check_status(&response, Operation::Create)?;
        decode_data(&response)
    }

    pub fn parse_fetch_account(&self, response: HttpResponse) -> Result<Account, Error> {
        check_status(&response, Operation::Fetch)?;
        decode_data(&response)
    }

    pub fn parse_delete_account(&self, response: HttpResponse) -> Result<(), Error> {
        check_status(&response, Operation::Delete)
    }

    fn collection_url(&self) -> String {
        format!("{}/{ACCOUNTS_PATH}", self.base_url)
    }
}

fn require_id(id: Uuid) -> Result<(), Error> {
    if id.is_nil() {
        return Err(Error::Validation("account id is required".to_string()));
    }
    Ok(())
}

/// `Accept` and `Date` on every request, plus `Content-Type` when a body is
/// sent.
fn request_headers(operation: Operation) -> Vec<(String, String)> {
    let mut headers = Vec::with_capacity(3);
    if operation == Operation::Create {
        headers.push((HEADER_CONTENT_TYPE.to_string(), JSON_API_CONTENT_TYPE.to_string()));
    }
    headers.push((HEADER_ACCEPT.to_string(), JSON_API_CONTENT_TYPE.to_string()));
    headers.push((
        HEADER_DATE.to_string(),
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    ));
    headers
}

/// Unify anything but the operation's success status into an `ApiError`.
fn check_status(response: &HttpResponse, operation: Operation) -> Result<(), Error> {
    if response.status == operation.success_status() {
        return Ok(());
    }
    Err(Error::Api(ApiError::from_response(response)))
}

fn decode_data<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, Error> {
    serde_json::from_slice::<Envelope<T>>(&response.body)
        .map(|envelope| envelope.data)
        .map_err(Error::Decode)
}
