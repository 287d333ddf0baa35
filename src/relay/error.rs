//! Relay pipeline errors.

use thiserror::Error;

/// Every way a relay can fail after validation has passed.
///
/// An upstream non-2xx answer is not an error; it is forwarded as-is.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No response was obtained (DNS, connect, TLS, timeout, bad scheme).
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// The whole-call budget ran out between hops.
    #[error("Upstream call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Too many redirects (max {max})")]
    TooManyRedirects { max: usize },

    #[error("Invalid redirect location from {from}: {reason}")]
    InvalidRedirect { from: String, reason: String },

    /// The connection broke while draining a JSON body.
    #[error("Failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Upstream JSON body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// Upstream declared `application/json` but sent something else.
    #[error("Error parsing JSON data: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

impl RelayError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MalformedJson(_) => "parse_error",
            RelayError::Body(_) | RelayError::BodyTooLarge { .. } => "body_error",
            RelayError::Transport(_)
            | RelayError::Timeout { .. }
            | RelayError::TooManyRedirects { .. }
            | RelayError::InvalidRedirect { .. } => "transport_error",
        }
    }
}
