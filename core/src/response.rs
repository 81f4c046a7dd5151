//! Decoding of service responses.
//!
//! Every response body is a JSON object wrapping its metadata in a
//! `subsonic-response` envelope: `status`, the server `version`, and on
//! failure an `error` object with `code` and `message`. The envelope is
//! decoded into typed optional fields; the rest of the payload is returned to
//! the caller untouched.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// Decoded response payload. `Null` for an empty body.
pub type Payload = Value;

/// Top-level key every response is wrapped in.
pub const ENVELOPE_KEY: &str = "subsonic-response";

/// Envelope status of a successful call.
pub const STATUS_OK: &str = "ok";

#[derive(Debug, Clone, Deserialize)]
struct Envelope {
    status: Option<String>,
    version: Option<String>,
    error: Option<ServiceError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServiceError {
    code: Option<i64>,
    message: Option<String>,
}

/// A decoded body whose envelope has not been checked yet.
#[derive(Debug, Clone)]
pub struct Response {
    payload: Payload,
    envelope: Option<Envelope>,
}

impl Response {
    /// Decode a raw body. Fails only when the body is not a conforming
    /// payload; a failed envelope status is reported by `into_payload`.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self {
                payload: Payload::Null,
                envelope: None,
            });
        }

        let payload: Payload =
            serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let root = payload
            .as_object()
            .ok_or_else(|| ApiError::Decode("expected a JSON object".to_string()))?;
        let envelope = root
            .get(ENVELOPE_KEY)
            .map(|value| Envelope::deserialize(value))
            .transpose()
            .map_err(|e| ApiError::Decode(format!("malformed {ENVELOPE_KEY}: {e}")))?;

        Ok(Self { payload, envelope })
    }

    /// Protocol version the server reported, if any.
    pub fn version(&self) -> Option<&str> {
        self.envelope.as_ref()?.version.as_deref()
    }

    /// Envelope status, if the server sent one.
    pub fn status(&self) -> Option<&str> {
        self.envelope.as_ref()?.status.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.status().map_or(true, |status| status == STATUS_OK)
    }

    /// Return the full payload, or the mapped error for a failed status.
    pub fn into_payload(self) -> Result<Payload> {
        if self.is_ok() {
            return Ok(self.payload);
        }
        let error = self.envelope.and_then(|envelope| envelope.error);
        let (code, message) = match error {
            Some(error) => (error.code, error.message),
            None => (None, None),
        };
        Err(ApiError::protocol(code, message))
    }
}
