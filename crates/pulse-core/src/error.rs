use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Build the `{"kind", "message"}` JSON error body shared by every service.
///
/// Services map their own error enums onto a status code and a stable
/// `kind` string, then call this to render the response.
pub fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "message": message.into(),
    });
    (status, axum::Json(body)).into_response()
}
