//! Authenticated client for the media service REST protocol.
//!
//! # Design
//! `ServiceClient` owns the normalized credentials, a `Transport`, and the
//! last protocol version the server reported. A call runs three steps:
//! `build_call` encodes the base and method parameters into an `HttpRequest`,
//! the transport executes it, and `interpret` decodes the body, records the
//! server version and maps a failed envelope to `ApiError::Protocol`.
//!
//! The first and last steps are public and IO-free, so a host that performs
//! its own HTTP can use them without a `Transport`.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::response::{Payload, Response};
use crate::types::{CredentialSource, IndexesQuery, Params, Search2Query, SearchQuery};

/// Client name sent as `c` with every request.
pub const CLIENT_NAME: &str = "subsonic-core";

/// REST protocol level this client speaks, sent as `v`.
pub const CLIENT_VERSION: &str = "1.6.0";

/// Response format requested with `f`.
pub const OUTPUT_FORMAT: &str = "json";

/// Path segment the service URL always ends in.
pub const REST_SEGMENT: &str = "rest";

/// First server version with `search2`; `search` is refused from here on.
///
/// Versions are compared as plain strings, so `"1.10.0"` sorts below this.
pub const SEARCH2_MIN_VERSION: &str = "1.4.0";

/// Parameter names owned by the client. Method parameters may not use them.
pub const RESERVED_KEYS: [&str; 5] = ["u", "p", "v", "c", "f"];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Default)]
struct ServerState {
    api_version: Option<String>,
}

/// Client for one media service account.
pub struct ServiceClient<T> {
    base_url: String,
    username: String,
    /// Always hex-encoded.
    password: String,
    method: HttpMethod,
    transport: T,
    server: RwLock<ServerState>,
}

impl<T: Transport> ServiceClient<T> {
    pub fn new<C: CredentialSource + ?Sized>(source: &C, transport: T) -> Self {
        let credentials = source.credentials();
        let password = if credentials.is_encoded {
            credentials.password
        } else {
            hex::encode(credentials.password.as_bytes())
        };
        Self {
            base_url: normalize_url(&credentials.url),
            username: credentials.username,
            password,
            method: HttpMethod::Post,
            transport,
            server: RwLock::new(ServerState::default()),
        }
    }

    /// Send parameters with `method` instead of the default POST body.
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Last protocol version reported by the server.
    pub fn api_version(&self) -> Option<String> {
        self.server
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .api_version
            .clone()
    }

    /// Form-encode the base parameters followed by `params`.
    pub fn encode_params(&self, params: &Params) -> String {
        let password = format!("enc:{}", self.password);
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer
            .append_pair("u", &self.username)
            .append_pair("p", &password)
            .append_pair("v", CLIENT_VERSION)
            .append_pair("c", CLIENT_NAME)
            .append_pair("f", OUTPUT_FORMAT);
        for (name, value) in params.iter() {
            if RESERVED_KEYS.contains(&name) {
                warn!(param = name, "dropping method parameter that shadows a base parameter");
                continue;
            }
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }

    /// Build the request for `method` without sending it.
    pub fn build_call(&self, method: &str, params: &Params) -> HttpRequest {
        let endpoint = format!("{}/{method}", self.base_url);
        let encoded = self.encode_params(params);
        match self.method {
            HttpMethod::Post => HttpRequest {
                method: HttpMethod::Post,
                url: endpoint,
                headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
                body: Some(encoded),
            },
            HttpMethod::Get => HttpRequest {
                method: HttpMethod::Get,
                url: format!("{endpoint}?{encoded}"),
                headers: Vec::new(),
                body: None,
            },
        }
    }

    /// Decode a response body, recording the server version it reports.
    pub fn interpret(&self, body: &[u8]) -> Result<Payload> {
        let response = Response::parse(body)?;
        if let Some(version) = response.version() {
            self.record_version(version);
        }
        response.into_payload().map_err(|err| {
            debug!(error = %err, "service reported a failure");
            err
        })
    }

    /// Call any method of the protocol and return its decoded payload.
    pub fn call(&self, method: &str, params: &Params) -> Result<Payload> {
        let request = self.build_call(method, params);
        debug!(method, endpoint = %self.base_url, params = params.len(), "dispatching call");
        let body = self.transport.send(&request)?;
        self.interpret(&body)
    }

    /// Test connectivity with the server.
    pub fn ping(&self) -> Result<Payload> {
        self.call("ping", &Params::new())
    }

    /// Details about the server's software license.
    pub fn get_license(&self) -> Result<Payload> {
        self.call("getLicense", &Params::new())
    }

    /// All configured top-level music folders.
    pub fn get_music_folders(&self) -> Result<Payload> {
        self.call("getMusicFolders", &Params::new())
    }

    /// What is currently being played by all users.
    pub fn get_now_playing(&self) -> Result<Payload> {
        self.call("getNowPlaying", &Params::new())
    }

    /// Indexed structure of all artists.
    pub fn get_indexes(&self, query: &IndexesQuery) -> Result<Payload> {
        self.call("getIndexes", &query.to_params())
    }

    /// Legacy search. Returns `Ok(None)` without contacting the server once
    /// the server is known to speak `SEARCH2_MIN_VERSION` or later.
    ///
    /// The gate reads a snapshot of the recorded version; a reply racing on
    /// another thread may change it before this call is sent.
    pub fn search(&self, query: &SearchQuery) -> Result<Option<Payload>> {
        if let Some(version) = self.api_version() {
            if version.as_str() >= SEARCH2_MIN_VERSION {
                info!(%version, "search is deprecated on this server, use search2");
                return Ok(None);
            }
        }
        self.call("search", &query.to_params()).map(Some)
    }

    /// Paged search. Returns `Ok(None)` without contacting the server when
    /// the server is known to predate `SEARCH2_MIN_VERSION`.
    ///
    /// Gated on the same version snapshot as [`search`](Self::search).
    pub fn search2(&self, query: &Search2Query) -> Result<Option<Payload>> {
        if let Some(version) = self.api_version() {
            if version.as_str() < SEARCH2_MIN_VERSION {
                info!(%version, "search2 is not available on this server");
                return Ok(None);
            }
        }
        self.call("search2", &query.to_params()).map(Some)
    }

    fn record_version(&self, version: &str) {
        let mut state = self.server.write().unwrap_or_else(PoisonError::into_inner);
        if state.api_version.as_deref() != Some(version) {
            info!(version, previous = ?state.api_version, "server API version");
            state.api_version = Some(version.to_string());
        }
    }
}

impl<T> fmt::Debug for ServiceClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Make `url` end in exactly one `/rest` segment.
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let suffix = format!("/{REST_SEGMENT}");
    if trimmed.ends_with(&suffix) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{suffix}")
    }
}
