//! Request field extraction.

use axum::{
    body::Bytes,
    extract::{Form, FromRequest, Query, Request},
    http::header,
};
use serde_json::Value;

use crate::Fields;
use crate::errors::ApiError;

/// All submitted input of a request as one field map.
///
/// Query-string parameters come first (as strings); the body is overlaid on
/// top, so body keys win. The body may be a JSON object or a
/// `application/x-www-form-urlencoded` form. An empty body is fine; any other
/// body is rejected with a 400 envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFields(pub Fields);

impl<S> FromRequest<S> for RequestFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut fields = Fields::new();

        if req.uri().query().is_some() {
            let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
                .map_err(|err| ApiError::bad_request(err.body_text()))?;
            for (key, value) in pairs {
                fields.insert(key, Value::String(value));
            }
        }

        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|err| ApiError::bad_request(err.body_text()))?;
            for (key, value) in pairs {
                fields.insert(key, Value::String(value));
            }
            return Ok(Self(fields));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|err| ApiError::bad_request(err.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(fields));
        }

        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(object)) => {
                fields.extend(object);
                Ok(Self(fields))
            }
            Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
            Err(err) => {
                tracing::debug!(error = %err, "Rejected malformed JSON body");
                Err(ApiError::bad_request("Malformed JSON body"))
            }
        }
    }
}
