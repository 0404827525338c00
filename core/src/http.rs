//! HTTP request and response types described as plain data.
//!
//! # Design
//! The client builds `HttpRequest` values and parses `HttpResponse` values.
//! Executing the round-trip is the job of a `Transport`, so the request
//! building and response parsing stay deterministic and easy to test.
//!
//! Bodies are raw bytes. A response body is drained by the transport before
//! the `HttpResponse` is handed back, so nothing downstream ever holds an
//! open stream.

/// Media type used for both `Accept` and `Content-Type`.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_DATE: &str = "date";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// The three logical operations supported on the accounts resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Fetch,
    Delete,
}

impl Operation {
    pub fn method(self) -> HttpMethod {
        match self {
            Operation::Create => HttpMethod::Post,
            Operation::Fetch => HttpMethod::Get,
            Operation::Delete => HttpMethod::Delete,
        }
    }

    /// The single status code that counts as success for this operation.
    pub fn success_status(self) -> u16 {
        match self {
            Operation::Create => 201,
            Operation::Fetch => 200,
            Operation::Delete => 204,
        }
    }

    /// Whether the operation may be re-issued after a transient failure.
    /// Creation is not idempotent and is always dispatched exactly once.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Operation::Create)
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response with its body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
