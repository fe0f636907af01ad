//! HTTP Response Building
//!
//! Every reply the service sends goes through [`ResponseBuilder`] so JSON
//! bodies, status codes and the `x-request-id` header stay consistent.

use crate::error::ApiError;
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use warp::http::{HeaderMap, HeaderValue, StatusCode};
use warp::reply;
use warp::Reply;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    /// Create a 200 JSON response builder.
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            status: StatusCode::OK,
            headers,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Set the `x-request-id` header.
    pub fn with_request_id(self, request_id: &str) -> Self {
        self.with_header(REQUEST_ID_HEADER, request_id)
    }

    /// Add a header; names or values that are not valid HTTP are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Ok(header_name) = warp::http::HeaderName::from_bytes(name.as_bytes()) {
            if let Ok(header_value) = HeaderValue::from_str(value) {
                self.headers.insert(header_name, header_value);
            }
        }
        self
    }

    /// Serialize `body` and finish the response.
    pub fn json<T: Serialize>(self, body: &T) -> reply::Response {
        let mut response = reply::with_status(reply::json(body), self.status).into_response();

        let headers_mut = response.headers_mut();
        for (key, value) in self.headers {
            if let Some(key) = key {
                headers_mut.insert(key, value);
            }
        }

        debug!(status = self.status.as_u16(), "Built response");
        response
    }

    /// Error reply with the status and body [`ApiError`] maps the error to.
    ///
    /// Validation failures become 422 with the full violation list.
    pub fn build_error(self, error: &ApiError) -> reply::Response {
        self.with_status(error.status_code()).json(&error.to_json())
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `{"detail": "<message>"}` with the given status.
pub fn create_error_response(status: StatusCode, detail: &str) -> reply::Response {
    ResponseBuilder::new()
        .with_status(status)
        .json(&json!({ "detail": detail }))
}
