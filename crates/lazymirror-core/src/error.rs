//! Shared error type across lazymirror crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed request path or invalid configuration.
    BadRequest,
    /// Method not served by the mirror.
    MethodNotAllowed,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Origin could not be reached or answered with an unexpected status.
    OriginFailed,
    /// Local store or state file could not be read or written.
    Storage,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::OriginFailed => "ORIGIN_FAILED",
            ClientCode::Storage => "STORAGE",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status the generic error stage answers with.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => 400,
            ClientCode::MethodNotAllowed => 405,
            ClientCode::OriginFailed | ClientCode::Storage | ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Unified error type used by core and server.
///
/// `Clone` so one fill outcome can be handed to every request waiting on it.
#[derive(Debug, Clone, Error)]
pub enum MirrorError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("origin returned {status} for {url}")]
    OriginStatus { status: u16, url: String },
    #[error("origin unreachable: {0}")]
    OriginUnreachable(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl MirrorError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            MirrorError::BadRequest(_) => ClientCode::BadRequest,
            MirrorError::MethodNotAllowed => ClientCode::MethodNotAllowed,
            MirrorError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            MirrorError::OriginStatus { .. } | MirrorError::OriginUnreachable(_) => {
                ClientCode::OriginFailed
            }
            MirrorError::Storage(_) => ClientCode::Storage,
            MirrorError::Internal(_) => ClientCode::Internal,
        }
    }
}

impl From<std::io::Error> for MirrorError {
    fn from(e: std::io::Error) -> Self {
        MirrorError::Storage(e.to_string())
    }
}
