//! Generic error stage: turns `MirrorError` into the client-visible response.

use axum::{
    http::{header::ALLOW, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use lazymirror_core::error::MirrorError;

/// `MirrorError` carried out of a handler.
#[derive(Debug)]
pub struct ApiError(pub MirrorError);

impl From<MirrorError> for ApiError {
    fn from(e: MirrorError) -> Self {
        Self(e)
    }
}

fn error_json(code: &str, msg: &str) -> serde_json::Value {
    json!({
        "error": {
            "code": code,
            "msg": msg
        }
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // server-side detail stays in the log
        let msg = if status.is_server_error() {
            tracing::warn!(error = %self.0, code = code.as_str(), "request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(error = %self.0, code = code.as_str(), "request rejected");
            self.0.to_string()
        };

        let mut resp = (status, Json(error_json(code.as_str(), &msg))).into_response();
        if matches!(self.0, MirrorError::MethodNotAllowed) {
            resp.headers_mut().insert(ALLOW, HeaderValue::from_static("GET,HEAD"));
        }
        resp
    }
}
