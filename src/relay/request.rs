//! Relay request model and validation.
//!
//! Validation runs on the raw JSON value so that every problem is reported
//! at once with the offending field, and nothing reaches the outbound call
//! unless the whole request is well-formed.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

/// Outbound verbs the relay accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMethod {
    Get,
    Post,
    Delete,
    Put,
    Patch,
}

impl RelayMethod {
    pub const ALL: [RelayMethod; 5] = [
        RelayMethod::Get,
        RelayMethod::Post,
        RelayMethod::Delete,
        RelayMethod::Put,
        RelayMethod::Patch,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMethod::Get => "get",
            RelayMethod::Post => "post",
            RelayMethod::Delete => "delete",
            RelayMethod::Put => "put",
            RelayMethod::Patch => "patch",
        }
    }

    pub fn to_http(self) -> reqwest::Method {
        match self {
            RelayMethod::Get => reqwest::Method::GET,
            RelayMethod::Post => reqwest::Method::POST,
            RelayMethod::Delete => reqwest::Method::DELETE,
            RelayMethod::Put => reqwest::Method::PUT,
            RelayMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

impl std::fmt::Display for RelayMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request to relay upstream.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub method: RelayMethod,
    pub url: Url,
    /// Caller headers, passed through verbatim. Empty when none were given.
    pub headers: HeaderMap,
    /// JSON body. `None` means the outbound call carries no body at all.
    pub data: Option<Map<String, Value>>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All validation failures found in one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

const KNOWN_KEYS: [&str; 4] = ["method", "url", "headers", "data"];

impl RelayRequest {
    /// Validate an inbound body and build the request from it.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let Some(fields) = body.as_object() else {
            return Err(ValidationErrors::single("body", "\"value\" must be of type object"));
        };

        for key in fields.keys() {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                errors.push(key.as_str(), format!("\"{}\" is not allowed", key));
            }
        }

        let method = match fields.get("method") {
            None => {
                errors.push("method", "\"method\" is required");
                None
            }
            Some(value) => {
                let parsed = value.as_str().and_then(RelayMethod::parse);
                if parsed.is_none() {
                    errors.push(
                        "method",
                        "\"method\" must be one of [get, post, delete, put, patch]",
                    );
                }
                parsed
            }
        };

        let url = match fields.get("url") {
            None => {
                errors.push("url", "\"url\" is required");
                None
            }
            Some(value) => {
                let parsed = value.as_str().and_then(|s| Url::parse(s).ok());
                if parsed.is_none() {
                    errors.push("url", "\"url\" must be a valid uri");
                }
                parsed
            }
        };

        let headers = match fields.get("headers") {
            None => HeaderMap::new(),
            Some(Value::Object(map)) => convert_headers(map, &mut errors),
            Some(_) => {
                errors.push("headers", "\"headers\" must be of type object");
                HeaderMap::new()
            }
        };

        let data = match fields.get("data") {
            None => None,
            Some(Value::Object(map)) => Some(map.clone()),
            Some(_) => {
                errors.push("data", "\"data\" must be of type object");
                None
            }
        };

        match (method, url) {
            (Some(method), Some(url)) if errors.is_empty() => Ok(RelayRequest {
                method,
                url,
                headers,
                data,
            }),
            _ => Err(errors),
        }
    }
}

fn convert_headers(map: &Map<String, Value>, errors: &mut ValidationErrors) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(map.len());

    for (name, value) in map {
        let field = format!("headers.{}", name);
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Array(_) | Value::Object(_) => {
                errors.push(
                    field.as_str(),
                    format!("\"{}\" must be a string, number or boolean", field),
                );
                continue;
            }
        };

        let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
            errors.push(field.as_str(), format!("\"{}\" is not a valid header name", field));
            continue;
        };
        let Ok(header_value) = HeaderValue::from_str(&text) else {
            errors.push(field.as_str(), format!("\"{}\" is not a valid header value", field));
            continue;
        };
        headers.append(header_name, header_value);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_minimal_request() {
        let req = RelayRequest::from_json(&json!({
            "method": "get",
            "url": "https://example.com/items"
        }))
        .unwrap();

        assert_eq!(req.method, RelayMethod::Get);
        assert_eq!(req.url.as_str(), "https://example.com/items");
        assert!(req.headers.is_empty());
        assert!(req.data.is_none());
    }

    #[test]
    fn keeps_headers_and_data() {
        let req = RelayRequest::from_json(&json!({
            "method": "post",
            "url": "http://localhost:9000/submit",
            "headers": { "X-Token": "abc", "X-Count": 3, "X-Flag": true, "X-Skip": null },
            "data": { "name": "relay" }
        }))
        .unwrap();

        assert_eq!(req.headers.get("x-token").unwrap(), "abc");
        assert_eq!(req.headers.get("x-count").unwrap(), "3");
        assert_eq!(req.headers.get("x-flag").unwrap(), "true");
        assert!(req.headers.get("x-skip").is_none());
        assert_eq!(req.data.unwrap().get("name"), Some(&json!("relay")));
    }

    #[test]
    fn empty_data_object_is_still_a_body() {
        let req = RelayRequest::from_json(&json!({
            "method": "put",
            "url": "http://localhost/x",
            "data": {}
        }))
        .unwrap();
        assert_eq!(req.data, Some(Map::new()));
    }

    #[test]
    fn rejects_missing_url() {
        let errors = RelayRequest::from_json(&json!({ "method": "get" })).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["url"]);
        assert_eq!(errors.to_string(), "\"url\" is required");
    }

    #[test]
    fn rejects_head_method() {
        let errors = RelayRequest::from_json(&json!({
            "method": "head",
            "url": "http://example.com"
        }))
        .unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["method"]);
    }

    #[test]
    fn method_is_case_sensitive() {
        assert!(RelayMethod::parse("GET").is_none());
        assert_eq!(RelayMethod::parse("patch"), Some(RelayMethod::Patch));
    }

    #[test]
    fn rejects_relative_url() {
        let errors = RelayRequest::from_json(&json!({
            "method": "get",
            "url": "/just/a/path"
        }))
        .unwrap_err();
        assert_eq!(errors.errors()[0].message, "\"url\" must be a valid uri");
    }

    #[test]
    fn reports_every_problem_at_once() {
        let errors = RelayRequest::from_json(&json!({
            "url": 42,
            "headers": "nope",
            "data": [1, 2],
            "extra": true
        }))
        .unwrap_err();

        let mut fields: Vec<_> = errors.fields().collect();
        fields.sort_unstable();
        assert_eq!(fields, ["data", "extra", "headers", "method", "url"]);
    }

    #[test]
    fn rejects_non_object_body() {
        let errors = RelayRequest::from_json(&json!(["get"])).unwrap_err();
        assert_eq!(errors.fields().collect::<Vec<_>>(), ["body"]);
    }

    #[test]
    fn rejects_bad_header_entries() {
        let errors = RelayRequest::from_json(&json!({
            "method": "get",
            "url": "http://example.com",
            "headers": { "bad name": "x", "X-Nested": { "a": 1 }, "X-Newline": "a\nb" }
        }))
        .unwrap_err();

        let mut fields: Vec<_> = errors.fields().collect();
        fields.sort_unstable();
        assert_eq!(fields, ["headers.X-Nested", "headers.X-Newline", "headers.bad name"]);
    }
}
