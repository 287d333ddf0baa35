//! Inbound request extraction.
//!
//! # Responsibilities
//! - Accept JSON or URL-encoded form bodies
//! - Validate the body into a [`RelayRequest`] before the handler runs
//! - Reject with 400 and field-level detail otherwise
//!
//! # Design Decisions
//! - A body with any other content type validates as an empty object, so
//!   the caller learns which fields are required
//! - Body size limits are enforced by the layer stack, not here

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::relay::{RelayRequest, ValidationErrors};

/// A validated relay request extracted from the inbound body.
#[derive(Debug, Clone)]
pub struct ValidRelay(pub RelayRequest);

/// How the inbound body was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(content_type: Option<&str>) -> BodyKind {
    let Some(content_type) = content_type else {
        return BodyKind::Other;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

/// Decode the raw body into a JSON value according to its content type.
fn decode_body(kind: BodyKind, bytes: &[u8]) -> Result<Value, ValidationErrors> {
    match kind {
        BodyKind::Json if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Value::Object(Map::new())),
        BodyKind::Json => serde_json::from_slice(bytes)
            .map_err(|e| ValidationErrors::single("body", format!("Invalid JSON body: {}", e))),
        BodyKind::Form => {
            let fields = url::form_urlencoded::parse(bytes)
                .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                .collect::<Map<String, Value>>();
            Ok(Value::Object(fields))
        }
        BodyKind::Other => Ok(Value::Object(Map::new())),
    }
}

impl<S> FromRequest<S> for ValidRelay
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let kind = body_kind(req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()));
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let request = decode_body(kind, &bytes)
            .and_then(|value| RelayRequest::from_json(&value))
            .map_err(|errors| {
                tracing::debug!(errors = %errors, "Rejected relay request");
                metrics::record_rejected();
                errors.into_response()
            })?;

        Ok(ValidRelay(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_body_kinds() {
        assert_eq!(body_kind(Some("application/json")), BodyKind::Json);
        assert_eq!(body_kind(Some("Application/JSON; charset=utf-8")), BodyKind::Json);
        assert_eq!(body_kind(Some("application/merge-patch+json")), BodyKind::Json);
        assert_eq!(
            body_kind(Some("application/x-www-form-urlencoded")),
            BodyKind::Form
        );
        assert_eq!(body_kind(Some("text/plain")), BodyKind::Other);
        assert_eq!(body_kind(None), BodyKind::Other);
    }

    #[test]
    fn form_body_becomes_string_fields() {
        let value = decode_body(BodyKind::Form, b"method=get&url=http%3A%2F%2Fexample.com%2F").unwrap();
        let request = RelayRequest::from_json(&value).unwrap();
        assert_eq!(request.url.as_str(), "http://example.com/");
    }

    #[test]
    fn empty_json_body_reports_required_fields() {
        let value = decode_body(BodyKind::Json, b"").unwrap();
        let errors = RelayRequest::from_json(&value).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["method", "url"]);
    }

    #[test]
    fn broken_json_is_a_body_error() {
        let errors = decode_body(BodyKind::Json, b"{\"method\":").unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["body"]);
    }

    #[test]
    fn unknown_content_type_is_treated_as_empty() {
        let value = decode_body(BodyKind::Other, b"method=get").unwrap();
        assert_eq!(value, Value::Object(Map::new()));
    }
}
