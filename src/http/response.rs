//! Response shaping.
//!
//! # Responsibilities
//! - Render relay outcomes into the outward JSON contract
//! - Stream forwarded upstream error bodies without buffering
//! - Map pipeline and validation errors to status codes
//!
//! # Outward Shapes
//! - 200 `{"urls": [...], "success": true, "data": ...}` for JSON upstreams
//! - 200 `{"urls": [...]}` for any other 2xx
//! - upstream status + raw body for upstream non-2xx
//! - 500 plain text for unparsable JSON
//! - 500 `{"success": false, "error": ...}` for everything else
//! - 400 `{"success": false, "error": "Validation failed", "details": [...]}`

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::relay::{FieldError, RelayError, UpstreamOutcome, ValidationErrors};

/// Success body. `success`/`data` are left out entirely for non-JSON upstreams.
#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Failure body shared by pipeline and validation errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<&'a [FieldError]>,
}

impl IntoResponse for UpstreamOutcome {
    fn into_response(self) -> Response {
        match self {
            UpstreamOutcome::Json { urls, data } => Json(RelayResponse {
                urls: urls.into_urls(),
                success: Some(true),
                data: Some(data),
            })
            .into_response(),
            UpstreamOutcome::NonJson { urls } => Json(RelayResponse {
                urls: urls.into_urls(),
                success: None,
                data: None,
            })
            .into_response(),
            UpstreamOutcome::Forward(upstream) => forward(upstream),
        }
    }
}

/// Pass an upstream answer through: status, content type, body stream.
fn forward(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    response
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::MalformedJson(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    error: self.to_string(),
                    details: None,
                }),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                error: "Validation failed".to_string(),
                details: Some(self.errors()),
            }),
        )
            .into_response()
    }
}
