//! Request-relay pipeline.
//!
//! # Data Flow
//! ```text
//! RelayRequest (already validated)
//!     → client.rs (outbound call, redirect hops)
//!         ↳ trail.rs (visited URLs, one accumulator per call)
//!     → classify:
//!         non-2xx            → Forward (status + raw body stream)
//!         2xx + JSON         → Json (drained, parsed)
//!         2xx + anything else → Urls only, body discarded
//! ```
//!
//! # Design Decisions
//! - Only the JSON path buffers; forwarded error bodies stay streams
//! - Redirects are followed here, not inside the HTTP client, so each hop
//!   is observed
//! - No retries: one upstream attempt per inbound request

pub mod client;
pub mod error;
pub mod redirect;
pub mod request;
pub mod trail;

use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use serde_json::Value;

pub use client::UpstreamClient;
pub use error::RelayError;
pub use request::{FieldError, RelayMethod, RelayRequest, ValidationErrors};
pub use trail::VisitTrail;

use crate::config::RelayConfig;

/// Result of a relay that received an upstream response.
#[derive(Debug)]
pub enum UpstreamOutcome {
    /// 2xx with a JSON body that parsed.
    Json { urls: VisitTrail, data: Value },
    /// 2xx with any other content type; the body was not read.
    NonJson { urls: VisitTrail },
    /// Upstream answered with a non-2xx status. The body is still unread.
    Forward(Response),
}

impl UpstreamOutcome {
    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamOutcome::Json { .. } => "json",
            UpstreamOutcome::NonJson { .. } => "non_json",
            UpstreamOutcome::Forward(_) => "upstream_error",
        }
    }
}

/// The relay core: outbound call plus response classification.
#[derive(Debug, Clone)]
pub struct Relay {
    client: UpstreamClient,
    max_json_body_bytes: usize,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: UpstreamClient::new(&config.upstream, &config.timeouts)?,
            max_json_body_bytes: config.upstream.max_json_body_bytes,
        })
    }

    /// Run one relay end to end.
    pub async fn run(&self, request: &RelayRequest) -> Result<UpstreamOutcome, RelayError> {
        let mut trail = VisitTrail::new();
        let response = self.client.execute(request, &mut trail).await?;

        if trail.hops() > 0 {
            crate::observability::metrics::record_redirects(trail.hops());
        }

        classify(response, trail, self.max_json_body_bytes).await
    }
}

/// Turn a received upstream response into an outcome.
pub async fn classify(
    response: Response,
    urls: VisitTrail,
    max_json_body_bytes: usize,
) -> Result<UpstreamOutcome, RelayError> {
    if !response.status().is_success() {
        return Ok(UpstreamOutcome::Forward(response));
    }

    if !is_json(&response) {
        return Ok(UpstreamOutcome::NonJson { urls });
    }

    let body = drain(response, max_json_body_bytes).await?;
    let text = String::from_utf8_lossy(&body);
    let data = serde_json::from_str(&text).map_err(RelayError::MalformedJson)?;

    Ok(UpstreamOutcome::Json { urls, data })
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("application/json"))
}

/// Read the whole body, refusing to grow past `limit` bytes.
async fn drain(mut response: Response, limit: usize) -> Result<Vec<u8>, RelayError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(RelayError::Body)? {
        if body.len() + chunk.len() > limit {
            return Err(RelayError::BodyTooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
