/// Centralized helpers for WebSocket and HTTP error responses.
///
/// Use these helpers to ensure all error messages are consistent, explicit, and include a code and context.
use actix_http::StatusCode;
use actix_web::HttpResponse;
use serde_json::{json, Value};

use crate::error::StoreError;

/// Formats a WebSocket error message as a JSON string.
///
/// # Arguments
/// - `code`: Unique error code (e.g. "NOT_SLOT_OWNER").
/// - `message`: Human-readable error message (in English).
/// - `context`: Optional context (e.g. client_id, match_id).
pub fn ws_error_message(code: &str, message: &str, context: Option<Value>) -> String {
    json!({
        "action": "Error",
        "data": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(Value::Null),
        }
    })
    .to_string()
}

/// Formats a store error for a WebSocket client.
pub fn ws_store_error_message(err: &StoreError, context: Option<Value>) -> String {
    ws_error_message(err.code(), &err.to_string(), context)
}

/// Returns a WebSocket message for session kicked (unicity violation).
pub fn ws_session_kicked_message(reason: &str, context: Option<Value>) -> String {
    ws_error_message("SESSION_KICKED", reason, context)
}

/// Returns an HTTP error response with a JSON body.
///
/// # Arguments
/// - `code`: Unique error code.
/// - `message`: Human-readable error message.
/// - `context`: Optional context value.
/// - `status`: HTTP status code.
pub fn http_error_response(
    code: &str,
    message: &str,
    context: Option<Value>,
    status: StatusCode,
) -> HttpResponse {
    let body = json!({
        "error": {
            "code": code,
            "message": message,
            "context": context.unwrap_or(Value::Null),
        }
    });
    HttpResponse::build(status).json(body)
}
