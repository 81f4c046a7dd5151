//! HTTP request type and the transport boundary.
//!
//! # Design
//! `HttpRequest` describes a call as plain data. `ServiceClient` builds it,
//! hands it to a `Transport`, and interprets the returned bytes. Hosts that
//! own their IO can skip the trait entirely and drive `build_call` /
//! `interpret` themselves.
//!
//! `UreqTransport` (default `ureq` feature) is the blocking production
//! implementation. Timeouts live here, not in the client.

use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Executes one request and returns the raw response body.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        (**self).send(request)
    }
}

/// Settings for the bundled transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Upper bound for a whole request, connect through body. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Largest response body accepted, in bytes. `None` reads bodies of any size.
    pub max_body: Option<u64>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            max_body: None,
        }
    }
}

/// Blocking transport backed by a `ureq` agent.
#[cfg(feature = "ureq")]
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    max_body: u64,
}

#[cfg(feature = "ureq")]
impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("max_body", &self.max_body)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "ureq")]
impl UreqTransport {
    pub fn new() -> Self {
        Self::with_config(&TransportConfig::default())
    }

    pub fn with_config(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            max_body: config.max_body.unwrap_or(u64::MAX),
        }
    }
}

#[cfg(feature = "ureq")]
impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "ureq")]
impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        let mut response = match request.method {
            HttpMethod::Get => self.agent.get(request.url.as_str()).call()?,
            HttpMethod::Post => {
                let mut builder = self.agent.post(request.url.as_str());
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                let body = request.body.as_deref().unwrap_or_default();
                builder.send(body.as_bytes())?
            }
        };
        // ureq caps `read_to_vec` at 10 MB unless a limit is given; index
        // and search payloads of large libraries exceed that.
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_body)
            .read_to_vec()?;
        Ok(body)
    }
}
