use thiserror::Error;

use crate::endpoint::ResultCode;

/// Top-level error type for the `sprinkly-api` crate.
///
/// Covers every failure mode of a single request/response exchange with
/// the device. `sprinkly-core` wraps these unchanged so callers can still
/// tell a network failure from a rejected value.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The device answered with a status outside 200-299.
    #[error("Request to '{endpoint}' could not be executed (HTTP {status})")]
    HttpStatus { endpoint: String, status: u16 },

    // ── Device envelope ─────────────────────────────────────────────
    /// The JSON envelope carried a `result` other than success.
    #[error("Request came back with result code: {code}")]
    InvalidRequest { code: ResultCode },

    // ── Data ────────────────────────────────────────────────────────
    /// The body was not a JSON object, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next polling tick.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the device rejected the shared secret.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest {
                code: ResultCode::Unauthorized
            }
        )
    }
}
