//! Error types for the accounts client.
//!
//! # Design
//! Every operation returns `Error`. Responses the server rejected land in
//! `Error::Api` carrying an `ApiError`, a plain value that compares by
//! field equality, so callers can match a specific failure with
//! `assert_eq!` or `==` instead of inspecting strings.
//!
//! `ApiError::from_response` is the single place where a terminal response
//! is turned into an error. It never fails: an empty body yields an error
//! with only the status, and a body that is not the expected JSON shape is
//! kept verbatim as the message.

use serde::{Deserialize, Serialize};

use crate::http::HttpResponse;
use crate::transport::TransportError;

/// An error reported by the API itself. `status` is always the status code
/// observed on the response, never a value taken from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("API error (status {status}): {}", describe(.message, .code))]
pub struct ApiError {
    #[serde(
        rename = "error_message",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,

    #[serde(rename = "error_code", default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip)]
    pub status: u16,
}

impl ApiError {
    /// An error with no message or code.
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Unify a terminal response into an `ApiError`.
    pub fn from_response(response: &HttpResponse) -> Self {
        if response.body.is_empty() {
            return Self::with_status(response.status);
        }

        match parse_error_object(&response.body) {
            Some(mut parsed) => {
                parsed.status = response.status;
                parsed
            }
            None => Self::with_status(response.status)
                .with_message(String::from_utf8_lossy(&response.body)),
        }
    }
}

/// Only a JSON object is an error body. Arrays would otherwise fill the
/// fields positionally.
fn parse_error_object(body: &[u8]) -> Option<ApiError> {
    match serde_json::from_slice::<serde_json::Value>(body).ok()? {
        value @ serde_json::Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    }
}

fn describe(message: &Option<String>, code: &Option<String>) -> String {
    match (message, code) {
        (Some(message), Some(code)) => format!("{message} (code {code})"),
        (Some(message), None) => message.clone(),
        (None, Some(code)) => format!("code {code}"),
        (None, None) => "no details".to_string(),
    }
}

/// Errors returned by `AccountsClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input was missing or invalid. Raised before any I/O.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The transport failed before a response was received.
    #[error("request error")]
    Transport(#[from] TransportError),

    /// The server answered with a status other than the expected success.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The success response body could not be decoded.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline passed before the operation finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl Error {
    /// The API error, if the server rejected the request.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// The transport failure, if no response was received.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Error::Transport(err) => Some(err),
            _ => None,
        }
    }
}
