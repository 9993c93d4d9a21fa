// Logical endpoints and device result codes.
//
// Read and write sides of the same logical area share a name but use
// different two-letter wire paths (`jc` / `cv`, `jo` / `co`, ...).

use std::fmt;

use strum::{Display, EnumIter, IntoStaticStr};

/// Endpoints that return a flat JSON object of property values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr, EnumIter)]
pub enum ReadEndpoint {
    /// Controller variables: device time, board count, status bits, ...
    #[strum(serialize = "jc")]
    ControllerVariables,
    /// Options, including the firmware version.
    #[strum(serialize = "jo")]
    Options,
    /// Station names and attribute masks.
    #[strum(serialize = "jn")]
    StationNamesAndAttributes,
}

impl ReadEndpoint {
    /// Wire path relative to the device root.
    pub fn path(self) -> &'static str {
        self.into()
    }
}

/// Endpoints that accept property changes as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, IntoStaticStr, EnumIter)]
pub enum WriteEndpoint {
    #[strum(serialize = "cv")]
    ControllerVariables,
    #[strum(serialize = "co")]
    Options,
    #[strum(serialize = "cs")]
    StationNamesAndAttributes,
    /// Manual station run (`sid`, `en`, `t`).
    #[strum(serialize = "cm")]
    ManualStation,
}

impl WriteEndpoint {
    /// Wire path relative to the device root.
    pub fn path(self) -> &'static str {
        self.into()
    }
}

/// Any endpoint the transport can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Read(ReadEndpoint),
    Write(WriteEndpoint),
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Read(ep) => ep.path(),
            Self::Write(ep) => ep.path(),
        }
    }
}

impl From<ReadEndpoint> for Endpoint {
    fn from(ep: ReadEndpoint) -> Self {
        Self::Read(ep)
    }
}

impl From<WriteEndpoint> for Endpoint {
    fn from(ep: WriteEndpoint) -> Self {
        Self::Write(ep)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// ── Result codes ─────────────────────────────────────────────────

/// The `result` field of a device response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    Success,
    Unauthorized,
    Mismatch,
    DataMissing,
    OutOfRange,
    DataFormatError,
    RfCodeError,
    PageNotFound,
    NotPermitted,
    Unknown(i64),
}

impl ResultCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Success,
            2 => Self::Unauthorized,
            3 => Self::Mismatch,
            16 => Self::DataMissing,
            17 => Self::OutOfRange,
            18 => Self::DataFormatError,
            19 => Self::RfCodeError,
            32 => Self::PageNotFound,
            48 => Self::NotPermitted,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Success => 1,
            Self::Unauthorized => 2,
            Self::Mismatch => 3,
            Self::DataMissing => 16,
            Self::OutOfRange => 17,
            Self::DataFormatError => 18,
            Self::RfCodeError => 19,
            Self::PageNotFound => 32,
            Self::NotPermitted => 48,
            Self::Unknown(code) => code,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Mismatch => "MISMATCH",
            Self::DataMissing => "DATA_MISSING",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::DataFormatError => "DATA_FORMAT_ERROR",
            Self::RfCodeError => "RF_CODE_ERROR",
            Self::PageNotFound => "PAGE_NOT_FOUND",
            Self::NotPermitted => "NOT_PERMITTED",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_paths() {
        assert_eq!(ReadEndpoint::ControllerVariables.path(), "jc");
        assert_eq!(ReadEndpoint::Options.path(), "jo");
        assert_eq!(ReadEndpoint::StationNamesAndAttributes.path(), "jn");
        assert_eq!(WriteEndpoint::ControllerVariables.path(), "cv");
        assert_eq!(WriteEndpoint::Options.path(), "co");
        assert_eq!(WriteEndpoint::StationNamesAndAttributes.path(), "cs");
        assert_eq!(WriteEndpoint::ManualStation.path(), "cm");
        assert_eq!(Endpoint::from(ReadEndpoint::Options).to_string(), "jo");
    }

    #[test]
    fn result_code_round_trips_known_and_unknown() {
        assert_eq!(ResultCode::from_code(1), ResultCode::Success);
        assert_eq!(ResultCode::from_code(48), ResultCode::NotPermitted);
        assert_eq!(ResultCode::from_code(99), ResultCode::Unknown(99));
        assert_eq!(ResultCode::Unknown(99).code(), 99);
        assert_eq!(ResultCode::Unauthorized.to_string(), "UNAUTHORIZED (2)");
    }
}
