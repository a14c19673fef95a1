//! The `{status, message, ...}` response envelope shared by every action.

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::errors::ApiError;
use crate::status::reason_phrase;

/// Content type of every envelope.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A rendered envelope: a catalog status code plus a flat JSON object whose
/// first two keys are always `status` and `message`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    code: StatusCode,
    body: Map<String, Value>,
}

impl ApiResponse {
    /// Envelope with no payload, e.g. `ApiResponse::status(404)`.
    ///
    /// # Errors
    /// [`ApiError::UnknownStatus`] when `code` is not in the catalog.
    pub fn status(code: u16) -> Result<Self, ApiError> {
        respond(code, Value::Null, "")
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.code
    }

    #[must_use]
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The `message` field of the envelope.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn into_body(self) -> Map<String, Value> {
        self.body
    }
}

/// Build an envelope for `code`.
///
/// `data` must be a JSON object (its keys are flattened into the envelope) or
/// `null` for no payload. The message is `message` when non-empty, otherwise
/// `data["message"]` (strings verbatim, anything else as JSON text), otherwise
/// empty. `status` and `message` always come first and override same-named
/// keys in `data`.
///
/// ```rust,ignore
/// respond(400, json!({"fails": ["The title field is required."]}), "Invalid parameters")?;
/// ```
///
/// # Errors
/// [`ApiError::UnknownStatus`] when `code` is not in the catalog, and
/// [`ApiError::Internal`] when `data` is neither an object nor `null`.
pub fn respond(code: u16, data: Value, message: &str) -> Result<ApiResponse, ApiError> {
    let phrase = reason_phrase(code).ok_or(ApiError::UnknownStatus(code))?;
    let status = StatusCode::from_u16(code).map_err(|_| ApiError::UnknownStatus(code))?;

    let data = match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ApiError::internal(
                "Failed to build response",
                Some(format!("response payload must be a JSON object, got {other}")),
            ));
        }
    };

    let message = if message.is_empty() {
        match data.get("message") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    } else {
        message.to_owned()
    };

    let mut body = Map::with_capacity(data.len() + 2);
    body.insert("status".to_owned(), Value::from(phrase));
    body.insert("message".to_owned(), Value::from(message));
    for (key, value) in data {
        if key != "status" && key != "message" {
            body.insert(key, value);
        }
    }

    Ok(ApiResponse { code: status, body })
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (
            self.code,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            Value::Object(self.body).to_string(),
        )
            .into_response()
    }
}
