//! Minimal HTTP/1.1 response encoding.
//!
//! Every response carries an exact `Content-Length` and `Connection: close`; there is
//! no chunked transfer and no keep-alive. Request decoding lives with the connection
//! handler in [`crate::server::decoder`].

use serde::Serialize;
use serde_json::Value;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Body used when a payload cannot be encoded as a JSON object or array.
pub const SERIALIZATION_ERROR_BODY: &[u8] =
    br#"{"error":{"message":"internal serialization error"}}"#;

/// A fully-buffered response ready to be written to a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    /// JSON response; see [`json_body`] for the fail-closed encoding rule.
    pub fn json<T: Serialize + ?Sized>(status: u16, payload: &T) -> Self {
        Self::new(status, CONTENT_TYPE_JSON, json_body(payload))
    }

    /// Parse the body back as JSON. Mostly useful in tests and logging.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Encode status line, headers and body.
    pub fn into_bytes(self) -> Vec<u8> {
        encode_response(self.status, &self.body, &self.content_type)
    }
}

/// Reason phrase for the handful of statuses this server emits.
///
/// Anything unexpected is labelled `OK`; clients key off the numeric code.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

/// Encode a complete HTTP/1.1 response.
///
/// ```
/// use bridgeport::http::encode_response;
///
/// let bytes = encode_response(200, b"{}", "application/json");
/// assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
/// assert!(bytes.ends_with(b"\r\n\r\n{}"));
/// ```
pub fn encode_response(status: u16, body: &[u8], content_type: &str) -> Vec<u8> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason_phrase(status),
        content_type,
        body.len()
    );
    let mut bytes = Vec::with_capacity(head.len() + body.len());
    bytes.extend_from_slice(head.as_bytes());
    bytes.extend_from_slice(body);
    bytes
}

/// Serialize a payload as a compact JSON document.
///
/// Fails closed: if serialization errors, or the payload is not a JSON object or
/// array at the top level, [`SERIALIZATION_ERROR_BODY`] is returned instead.
pub fn json_body<T: Serialize + ?Sized>(payload: &T) -> Vec<u8> {
    match serde_json::to_value(payload) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => {
            serde_json::to_vec(&value).unwrap_or_else(|_| SERIALIZATION_ERROR_BODY.to_vec())
        }
        Ok(_) => SERIALIZATION_ERROR_BODY.to_vec(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response payload");
            SERIALIZATION_ERROR_BODY.to_vec()
        }
    }
}
