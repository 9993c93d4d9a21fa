//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use sprinkly_config::ConfigError;
use sprinkly_core::{CoreError, ResultCode};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not talk to the device")]
    #[diagnostic(
        code(sprinkly::connection_failed),
        help(
            "Check that the device is powered and reachable from this host.\n\
             Try a longer --timeout or run with -vv for request logs."
        )
    )]
    ConnectionFailed {
        #[source]
        source: CoreError,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The device rejected the password")]
    #[diagnostic(
        code(sprinkly::auth_failed),
        help(
            "Verify the device password in your profile or pass --password.\n\
             Set password_is_hash = true if the profile stores the MD5 digest."
        )
    )]
    AuthFailed,

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(sprinkly::no_credentials),
        help("Add `password` to the profile, pass --password, or set SPRINKLY_PASSWORD.")
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(sprinkly::not_found),
        help("Run: sprinkly {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(sprinkly::conflict),
        help("Stop the running station first: sprinkly stations stop <station>")
    )]
    Conflict { message: String },

    // ── Device ───────────────────────────────────────────────────────
    #[error("Not supported by this device: {message}")]
    #[diagnostic(code(sprinkly::unsupported))]
    Unsupported { message: String },

    #[error("The device refused the request ({code})")]
    #[diagnostic(code(sprinkly::rejected))]
    Rejected { code: ResultCode },

    #[error("{message}")]
    #[diagnostic(code(sprinkly::device))]
    Device { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(sprinkly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(sprinkly::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Check the file shown by: sprinkly config path"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No device configured")]
    #[diagnostic(
        code(sprinkly::no_config),
        help(
            "Pass --url and --password, or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{0}")]
    #[diagnostic(code(sprinkly::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(sprinkly::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(sprinkly::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(sprinkly::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Unsupported { .. }
            | Self::Rejected {
                code: ResultCode::NotPermitted,
            } => exit_code::PERMISSION,
            _ => exit_code::GENERAL,
        }
    }

    pub(crate) fn station_not_found(identifier: &str) -> Self {
        Self::NotFound {
            resource_type: "station".into(),
            identifier: identifier.into(),
            list_command: "stations list".into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            err @ (CoreError::NotConnected | CoreError::Transport(_)) => {
                Self::ConnectionFailed { source: err }
            }

            CoreError::InvalidRequest {
                code: ResultCode::Unauthorized | ResultCode::Mismatch,
            } => Self::AuthFailed,

            CoreError::InvalidRequest { code } => Self::Rejected { code },

            err @ CoreError::StationAlreadyRunning { .. } => Self::Conflict {
                message: err.to_string(),
            },

            err @ CoreError::NotSupportedByFirmware { .. } => Self::Unsupported {
                message: err.to_string(),
            },

            CoreError::InvalidDuration => Self::Validation {
                field: "duration".into(),
                reason: "must be greater than zero".into(),
            },

            CoreError::OutOfRange { key, value } => Self::Validation {
                field: key.to_string(),
                reason: format!("{value} is not an accepted value"),
            },

            CoreError::Config { message } => Self::Config(message),

            other => Self::Device {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use sprinkly_core::{FirmwareVersion, PropertyKey};

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (CoreError::NotConnected, exit_code::CONNECTION),
            (
                CoreError::InvalidRequest {
                    code: ResultCode::Unauthorized,
                },
                exit_code::AUTH,
            ),
            (
                CoreError::InvalidRequest {
                    code: ResultCode::NotPermitted,
                },
                exit_code::PERMISSION,
            ),
            (
                CoreError::InvalidRequest {
                    code: ResultCode::DataMissing,
                },
                exit_code::GENERAL,
            ),
            (
                CoreError::StationAlreadyRunning { index: 3 },
                exit_code::CONFLICT,
            ),
            (
                CoreError::NotSupportedByFirmware {
                    key: PropertyKey::RainDelay,
                    firmware: FirmwareVersion::V2_1_0,
                },
                exit_code::PERMISSION,
            ),
            (CoreError::InvalidDuration, exit_code::USAGE),
            (
                CoreError::ValueMissing {
                    key: PropertyKey::DeviceTime,
                },
                exit_code::GENERAL,
            ),
        ];

        for (core, expected) in cases {
            let label = core.to_string();
            assert_eq!(CliError::from(core).exit_code(), expected, "{label}");
        }
    }

    #[test]
    fn config_errors_keep_their_meaning() {
        let err = CliError::from(ConfigError::UnknownProfile {
            name: "shed".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);

        let err = CliError::from(ConfigError::NoCredentials {
            profile: "garden".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
