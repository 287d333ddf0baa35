//! Visited-URL accumulator.
//!
//! One `VisitTrail` is created per inbound request and threaded by `&mut`
//! through the outbound call, so concurrent relays never share one.

use serde::{Serialize, Serializer};
use url::Url;

/// Ordered record of every URL a single relay touched.
///
/// Serializes as a plain array of URL strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitTrail {
    urls: Vec<String>,
    requests: usize,
    awaiting_response: bool,
}

impl VisitTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observation point fired before each outbound attempt.
    pub fn record_request(&mut self, url: &Url) {
        self.urls.push(url.to_string());
        self.requests += 1;
        self.awaiting_response = true;
    }

    /// Observation point fired after each received response, with the URL
    /// the response actually came from.
    ///
    /// A response from the URL this same hop requested is one visit, not two.
    pub fn record_response(&mut self, effective: &Url) {
        let same_hop = self.awaiting_response
            && self.urls.last().map(String::as_str) == Some(effective.as_str());
        if !same_hop {
            self.urls.push(effective.to_string());
        }
        self.awaiting_response = false;
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Number of redirect hops taken so far.
    pub fn hops(&self) -> usize {
        self.requests.saturating_sub(1)
    }

    pub fn last(&self) -> Option<&str> {
        self.urls.last().map(String::as_str)
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

impl Serialize for VisitTrail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.urls.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn direct_hit_is_one_entry() {
        let mut trail = VisitTrail::new();
        let target = url("http://example.com/a");
        trail.record_request(&target);
        trail.record_response(&target);

        assert_eq!(trail.urls(), ["http://example.com/a"]);
        assert_eq!(trail.hops(), 0);
    }

    #[test]
    fn redirect_chain_keeps_traversal_order() {
        let mut trail = VisitTrail::new();
        let first = url("http://example.com/start");
        let second = url("http://other.example/next");
        let third = url("https://other.example/end");

        for hop in [&first, &second, &third] {
            trail.record_request(hop);
            trail.record_response(hop);
        }

        assert_eq!(
            trail.urls(),
            [
                "http://example.com/start",
                "http://other.example/next",
                "https://other.example/end"
            ]
        );
        assert_eq!(trail.hops(), 2);
        assert_eq!(trail.last(), Some("https://other.example/end"));
    }

    #[test]
    fn revisiting_a_url_later_is_recorded() {
        let mut trail = VisitTrail::new();
        let a = url("http://example.com/a");
        let b = url("http://example.com/b");
        for hop in [&a, &b, &a] {
            trail.record_request(hop);
            trail.record_response(hop);
        }
        assert_eq!(trail.urls().len(), 3);
    }

    #[test]
    fn redirect_back_to_the_same_url_is_a_second_visit() {
        let mut trail = VisitTrail::new();
        let target = url("http://example.com/loop");
        for _ in 0..2 {
            trail.record_request(&target);
            trail.record_response(&target);
        }

        assert_eq!(trail.urls(), ["http://example.com/loop", "http://example.com/loop"]);
        assert_eq!(trail.hops(), 1);
    }

    #[test]
    fn response_from_elsewhere_is_recorded_after_the_request() {
        let mut trail = VisitTrail::new();
        trail.record_request(&url("http://example.com/asked"));
        trail.record_response(&url("http://example.com/served"));

        assert_eq!(trail.urls(), ["http://example.com/asked", "http://example.com/served"]);
        assert_eq!(trail.hops(), 0);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut trail = VisitTrail::new();
        trail.record_request(&url("http://example.com/"));
        let json = serde_json::to_value(&trail).unwrap();
        assert_eq!(json, serde_json::json!(["http://example.com/"]));
    }
}
