//! Redirect following rules.
//!
//! The outbound client never follows redirects on its own; the relay loop
//! asks [`next_hop`] after every response so each hop passes through the
//! visit trail.

use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::relay::error::RelayError;

/// Headers that must not leak to a different origin.
const SENSITIVE_HEADERS: [&str; 5] = [
    "authorization",
    "cookie",
    "cookie2",
    "proxy-authorization",
    "www-authenticate",
];

/// Body-describing headers dropped together with the body.
const BODY_HEADERS: [&str; 4] = [
    "content-type",
    "content-length",
    "content-encoding",
    "transfer-encoding",
];

/// Where and how to send the next request of a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub url: Url,
    pub method: Method,
    /// Whether the original body is replayed on the next hop.
    pub keep_body: bool,
}

/// Decide whether `status` + `headers` ask for another hop.
///
/// Returns `Ok(None)` for a final response, including a 3xx that carries no
/// `Location`.
pub fn next_hop(
    current: &Url,
    method: &Method,
    status: StatusCode,
    headers: &HeaderMap,
) -> Result<Option<Hop>, RelayError> {
    let (method, keep_body) = match status {
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER => {
            let method = match *method {
                Method::GET | Method::HEAD => method.clone(),
                _ => Method::GET,
            };
            (method, false)
        }
        StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT => (method.clone(), true),
        _ => return Ok(None),
    };

    let Some(location) = headers.get(header::LOCATION) else {
        return Ok(None);
    };

    let invalid = |reason: String| RelayError::InvalidRedirect {
        from: current.to_string(),
        reason,
    };

    let location = location
        .to_str()
        .map_err(|_| invalid("location is not valid ASCII".to_string()))?;
    let url = current.join(location).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    Ok(Some(Hop {
        url,
        method,
        keep_body,
    }))
}

/// Strip headers that must not follow the request to its next hop.
pub fn prepare_headers(headers: &mut HeaderMap, previous: &Url, hop: &Hop) {
    if !hop.keep_body {
        for name in BODY_HEADERS {
            headers.remove(name);
        }
    }

    if !same_origin(previous, &hop.url) {
        for name in SENSITIVE_HEADERS {
            headers.remove(name);
        }
    }
}

fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn location(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn current() -> Url {
        Url::parse("http://example.com/a/b").unwrap()
    }

    #[test]
    fn non_redirect_is_final() {
        let hop = next_hop(&current(), &Method::GET, StatusCode::OK, &location("/x")).unwrap();
        assert!(hop.is_none());
    }

    #[test]
    fn redirect_without_location_is_final() {
        let hop = next_hop(&current(), &Method::GET, StatusCode::FOUND, &HeaderMap::new()).unwrap();
        assert!(hop.is_none());
    }

    #[test]
    fn relative_location_resolves_against_current() {
        let hop = next_hop(&current(), &Method::GET, StatusCode::FOUND, &location("c"))
            .unwrap()
            .unwrap();
        assert_eq!(hop.url.as_str(), "http://example.com/a/c");

        let hop = next_hop(&current(), &Method::GET, StatusCode::FOUND, &location("/root"))
            .unwrap()
            .unwrap();
        assert_eq!(hop.url.as_str(), "http://example.com/root");
    }

    #[test]
    fn found_turns_post_into_get() {
        let hop = next_hop(&current(), &Method::POST, StatusCode::FOUND, &location("/next"))
            .unwrap()
            .unwrap();
        assert_eq!(hop.method, Method::GET);
        assert!(!hop.keep_body);
    }

    #[test]
    fn temporary_redirect_preserves_method_and_body() {
        let hop = next_hop(
            &current(),
            &Method::PATCH,
            StatusCode::TEMPORARY_REDIRECT,
            &location("https://other.example/next"),
        )
        .unwrap()
        .unwrap();
        assert_eq!(hop.method, Method::PATCH);
        assert!(hop.keep_body);
    }

    #[test]
    fn non_http_location_is_rejected() {
        let err = next_hop(
            &current(),
            &Method::GET,
            StatusCode::MOVED_PERMANENTLY,
            &location("ftp://example.com/file"),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::InvalidRedirect { .. }));
    }

    #[test]
    fn cross_origin_hop_drops_credentials() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-custom", HeaderValue::from_static("kept"));

        let hop = Hop {
            url: Url::parse("http://elsewhere.example/").unwrap(),
            method: Method::PUT,
            keep_body: true,
        };
        prepare_headers(&mut headers, &current(), &hop);

        assert!(headers.get(header::AUTHORIZATION).is_none());
        assert!(headers.get(header::CONTENT_TYPE).is_some());
        assert_eq!(headers.get("x-custom").unwrap(), "kept");
    }

    #[test]
    fn same_origin_hop_keeps_credentials_but_drops_body_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let hop = Hop {
            url: Url::parse("http://example.com:80/other").unwrap(),
            method: Method::GET,
            keep_body: false,
        };
        prepare_headers(&mut headers, &current(), &hop);

        assert!(headers.get(header::AUTHORIZATION).is_some());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
    }
}
