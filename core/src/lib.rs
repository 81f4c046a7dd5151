//! Synchronous client core for the media service REST protocol.
//!
//! # Overview
//! Builds authenticated form-encoded requests, sends them through a
//! pluggable `Transport`, and interprets the JSON `subsonic-response`
//! envelope into either the decoded payload or a typed `ApiError`.
//!
//! # Design
//! - `ServiceClient` holds normalized credentials and the last server
//!   protocol version; the version gates `search` versus `search2`.
//! - `build_call` and `interpret` are IO-free, so hosts that do their own
//!   HTTP can drive the protocol without a `Transport`.
//! - Optional arguments follow a sparse policy: blank values are never sent.
//! - `UreqTransport` (default `ureq` feature) is the bundled blocking
//!   transport.

pub mod client;
pub mod error;
pub mod http;
pub mod response;
pub mod types;

pub use client::{ServiceClient, CLIENT_NAME, CLIENT_VERSION, SEARCH2_MIN_VERSION};
pub use error::{ApiError, ErrorKind, Result, TransportError};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use http::{HttpMethod, HttpRequest, Transport, TransportConfig};
pub use response::{Payload, Response, ENVELOPE_KEY};
pub use types::{
    CredentialSource, Credentials, IndexesQuery, ParamValue, Params, Search2Query, SearchQuery,
};
