//! Error types for the media service client.
//!
//! # Design
//! Three failure families reach the caller and none is retried here:
//! - `Transport`: the request never produced a body. The transport's own
//!   error is carried untouched so network failure stays distinguishable from
//!   protocol failure.
//! - `Protocol`: the service answered with a non-`ok` envelope. The numeric
//!   code is classified through a fixed table into an `ErrorKind`.
//! - `Decode`: the body was not a conforming JSON payload.

use std::fmt;

use thiserror::Error;

/// Classification of a service-reported error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Generic,
    ParameterMissing,
    IncompatibleClient,
    IncompatibleServer,
    AuthFailure,
    Unauthorized,
    TrialExpired,
    NotFound,
}

/// Numeric service codes, in the order the protocol documents them.
///
/// Code 41 (token auth unsupported for LDAP users) is deliberately absent:
/// this client never uses token auth, so the code falls through to `Generic`.
const ERROR_TABLE: [(i64, ErrorKind); 8] = [
    (0, ErrorKind::Generic),
    (10, ErrorKind::ParameterMissing),
    (20, ErrorKind::IncompatibleClient),
    (30, ErrorKind::IncompatibleServer),
    (40, ErrorKind::AuthFailure),
    (50, ErrorKind::Unauthorized),
    (60, ErrorKind::TrialExpired),
    (70, ErrorKind::NotFound),
];

impl ErrorKind {
    /// Map a service error code to its kind. Unknown codes are `Generic`.
    pub fn from_code(code: i64) -> Self {
        ERROR_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Generic)
    }

    /// Message used when the service does not supply one.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Generic => "A generic error.",
            ErrorKind::ParameterMissing => "Required parameter is missing.",
            ErrorKind::IncompatibleClient => {
                "Incompatible REST protocol version. Client must upgrade."
            }
            ErrorKind::IncompatibleServer => {
                "Incompatible REST protocol version. Server must upgrade."
            }
            ErrorKind::AuthFailure => "Wrong username or password.",
            ErrorKind::Unauthorized => "User is not authorized for the given operation.",
            ErrorKind::TrialExpired => "The trial period for the server is over.",
            ErrorKind::NotFound => "The requested data was not found.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Generic => "generic error",
            ErrorKind::ParameterMissing => "parameter missing",
            ErrorKind::IncompatibleClient => "incompatible client",
            ErrorKind::IncompatibleServer => "incompatible server",
            ErrorKind::AuthFailure => "authentication failure",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::TrialExpired => "trial expired",
            ErrorKind::NotFound => "not found",
        };
        f.write_str(name)
    }
}

/// Failure reported by a [`Transport`](crate::http::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "ureq")]
impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => TransportError::Status(status),
            ureq::Error::Timeout(_) => TransportError::Timeout,
            ureq::Error::BadUri(uri) => TransportError::InvalidUrl(uri),
            ureq::Error::HostNotFound => TransportError::Connect("host not found".to_string()),
            ureq::Error::ConnectionFailed => {
                TransportError::Connect("connection failed".to_string())
            }
            ureq::Error::Io(io) => TransportError::Io(io),
            other => TransportError::Other(other.to_string()),
        }
    }
}

/// Errors returned by `ServiceClient` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The network round-trip failed before a body was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a failed status.
    #[error("{kind}: {message}")]
    Protocol {
        kind: ErrorKind,
        /// Raw code as sent by the service, if it sent one.
        code: Option<i64>,
        message: String,
    },

    /// The response body was not a conforming payload.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a protocol error, falling back to the kind's default message.
    pub fn protocol(code: Option<i64>, message: Option<String>) -> Self {
        let kind = code.map(ErrorKind::from_code).unwrap_or(ErrorKind::Generic);
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| kind.default_message().to_string());
        ApiError::Protocol {
            kind,
            code,
            message,
        }
    }

    /// The protocol error kind, or `None` for transport and decode failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Protocol { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;
