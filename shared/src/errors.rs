//! Shared error types for the enrichment pipeline

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },

    #[error("Invalid image locator: {input}")]
    InvalidLocator { input: String },

    #[error("HTTP client construction failed: {message}")]
    HttpClientError { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;

/// Failure categories reported by any external HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    AuthenticationFailed,
    NotFound,
    RateLimitExceeded,
    ServiceUnavailable,
    Timeout,
    NetworkError(String),
    ServerError(String),
}

impl ApiFailure {
    /// Classify a non-success HTTP status, keeping a short excerpt of the body
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 | 403 => ApiFailure::AuthenticationFailed,
            404 => ApiFailure::NotFound,
            408 | 504 => ApiFailure::Timeout,
            429 => ApiFailure::RateLimitExceeded,
            503 => ApiFailure::ServiceUnavailable,
            _ => ApiFailure::ServerError(format!("{}: {}", status, excerpt(body))),
        }
    }

    /// Classify a transport-level failure
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiFailure::Timeout
        } else {
            ApiFailure::NetworkError(error.to_string())
        }
    }

    /// Classify a google.rpc status embedded in a 200 response body
    pub fn from_rpc_code(code: i32, message: &str) -> Self {
        match code {
            4 => ApiFailure::Timeout,
            5 => ApiFailure::NotFound,
            7 | 16 => ApiFailure::AuthenticationFailed,
            8 => ApiFailure::RateLimitExceeded,
            14 => ApiFailure::ServiceUnavailable,
            _ => ApiFailure::ServerError(format!("rpc code {code}: {}", excerpt(message))),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::AuthenticationFailed => write!(f, "authentication failed"),
            ApiFailure::NotFound => write!(f, "not found"),
            ApiFailure::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ApiFailure::ServiceUnavailable => write!(f, "service unavailable"),
            ApiFailure::Timeout => write!(f, "request timed out"),
            ApiFailure::NetworkError(message) => write!(f, "network error: {message}"),
            ApiFailure::ServerError(message) => write!(f, "server error: {message}"),
        }
    }
}

fn excerpt(body: &str) -> &str {
    const MAX: usize = 200;
    let body = body.trim();
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
