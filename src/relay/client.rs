//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Build one pooled client for all relays
//! - Apply connect and whole-call timeouts
//! - Opt-in TLS verification bypass
//! - Walk redirect chains hop by hop, reporting each hop to the trail

use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Response};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::relay::error::RelayError;
use crate::relay::redirect::{next_hop, prepare_headers};
use crate::relay::request::RelayRequest;
use crate::relay::trail::VisitTrail;

/// Pooled outbound client shared by every relay.
///
/// Holds no per-request state; each call gets its own [`VisitTrail`].
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    max_redirects: usize,
    /// Budget for a whole call: every hop plus the final body.
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let mut builder = ClientBuilder::new()
            .redirect(Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs));

        if upstream.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for upstream calls");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if !upstream.system_proxy {
            builder = builder.no_proxy();
        }
        if let Some(user_agent) = &upstream.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let http = builder.build()?;

        tracing::debug!(
            connect_timeout_secs = timeouts.connect_secs,
            timeout_secs = timeouts.upstream_secs,
            max_redirects = upstream.max_redirects,
            "Upstream client created"
        );

        Ok(Self {
            http,
            max_redirects: upstream.max_redirects,
            timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Send `request` upstream, following redirects.
    ///
    /// Returns the final response with its body unread. Every hop is
    /// recorded in `trail` before it is sent and again once answered.
    ///
    /// One deadline covers the whole chain: each hop only gets what the
    /// previous hops left, and reading the final body counts against it too.
    pub async fn execute(
        &self,
        request: &RelayRequest,
        trail: &mut VisitTrail,
    ) -> Result<Response, RelayError> {
        let mut method = request.method.to_http();
        let mut url = request.url.clone();
        let mut headers = request.headers.clone();
        let mut body = request.data.as_ref();
        let mut redirects = 0;
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RelayError::Timeout {
                    secs: self.timeout.as_secs(),
                });
            }

            trail.record_request(&url);

            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .headers(headers.clone())
                .timeout(remaining);
            if let Some(data) = body {
                builder = builder.json(data);
            }

            let response = builder.send().await.map_err(RelayError::Transport)?;
            trail.record_response(response.url());

            let Some(hop) = next_hop(&url, &method, response.status(), response.headers())? else {
                return Ok(response);
            };

            if redirects == self.max_redirects {
                return Err(RelayError::TooManyRedirects {
                    max: self.max_redirects,
                });
            }
            redirects += 1;

            tracing::debug!(
                status = %response.status(),
                from = %url,
                to = %hop.url,
                "Following redirect"
            );

            prepare_headers(&mut headers, &url, &hop);
            if !hop.keep_body {
                body = None;
            }
            method = hop.method;
            url = hop.url;
        }
    }
}
