// ── Core error types ──
//
// Failures surfaced by the property engine. Transport failures pass
// through untouched in `Transport`; a rejected `result` code from the
// device is lifted into `InvalidRequest` so callers can match on it
// without digging into the api crate.

use sprinkly_api::ResultCode;
use strum::Display;
use thiserror::Error;

use crate::model::{FirmwareVersion, PropertyKey, ValueKind};

/// Which side of a property an endpoint lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Read,
    Write,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Not connected to the device (firmware version unknown)")]
    NotConnected,

    // ── Property errors ──────────────────────────────────────────────
    #[error("Property '{key}' is not supported by firmware {firmware}")]
    NotSupportedByFirmware {
        key: PropertyKey,
        firmware: FirmwareVersion,
    },

    #[error("Property '{key}' has no {direction} endpoint")]
    InvalidEndpoint {
        key: PropertyKey,
        direction: Direction,
    },

    #[error("Property '{key}' expects a {expected} value, got {found}")]
    InvalidConversion {
        key: PropertyKey,
        expected: ValueKind,
        found: String,
    },

    #[error("Value {value} is not valid for property '{key}'")]
    OutOfRange { key: PropertyKey, value: String },

    #[error("Property '{key}' has no value yet")]
    ValueMissing { key: PropertyKey },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Request came back with result code: {code}")]
    InvalidRequest { code: ResultCode },

    #[error("Station {index} is already running")]
    StationAlreadyRunning { index: usize },

    #[error("A manual run needs a duration greater than zero")]
    InvalidDuration,

    // ── Transport ────────────────────────────────────────────────────
    #[error(transparent)]
    Transport(sprinkly_api::Error),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for failures worth retrying on the next refresh.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_transient())
    }
}

impl From<sprinkly_api::Error> for CoreError {
    fn from(err: sprinkly_api::Error) -> Self {
        match err {
            sprinkly_api::Error::InvalidRequest { code } => Self::InvalidRequest { code },
            sprinkly_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            other => Self::Transport(other),
        }
    }
}
