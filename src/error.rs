//! Unified error types for the relay.

use thiserror::Error;

use crate::telemetry::Service;

/// Unified error type for the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Outbound HTTP client could not be built.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Startup configuration errors. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment could not be deserialized (missing variable, bad number).
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    /// A required variable is present but empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A variable has an unusable value.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Variable name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors from a single upstream call.
///
/// These never reach the display device; callers turn them into
/// placeholder frames.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        /// Which upstream.
        service: Service,
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Response body did not have the expected shape.
    #[error("malformed {service} response: {reason}")]
    Malformed {
        /// Which upstream.
        service: Service,
        /// Parse failure detail.
        reason: String,
    },

    /// Transport failure or timeout.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Longest response body kept in a [`UpstreamError::Status`].
    pub const MAX_BODY_LEN: usize = 512;

    /// Build a status error, truncating the body on a char boundary.
    pub fn status(service: Service, status: u16, body: &str) -> Self {
        let mut end = body.len().min(Self::MAX_BODY_LEN);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        UpstreamError::Status {
            service,
            status,
            body: body[..end].to_string(),
        }
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, RelayError>;
