//! JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jfeed_core::JfeedError;
use serde_json::json;

/// A core error rendered as `{"error": message}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub JfeedError);

impl ApiError {
    pub fn not_found(path: &str) -> Self {
        Self(JfeedError::NotFound {
            kind: "page".into(),
            key: path.into(),
        })
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.to_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<JfeedError> for ApiError {
    fn from(err: JfeedError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
