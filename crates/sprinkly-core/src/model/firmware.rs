use std::fmt;

use serde::{Serialize, Serializer};

/// Device firmware version in its dense integer encoding.
///
/// Firmware `2.1.x` is reported as `210 + x`, so `219` is `2.1.9`.
/// Ordering is plain integer ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FirmwareVersion(u32);

impl FirmwareVersion {
    pub const V2_1_0: Self = Self(210);
    pub const V2_1_1: Self = Self(211);
    pub const V2_1_2: Self = Self(212);
    pub const V2_1_3: Self = Self(213);
    pub const V2_1_4: Self = Self(214);
    pub const V2_1_5: Self = Self(215);
    pub const V2_1_6: Self = Self(216);
    pub const V2_1_7: Self = Self(217);
    pub const V2_1_8: Self = Self(218);
    pub const V2_1_9: Self = Self(219);

    /// Newest firmware this client has been checked against.
    pub const LATEST_KNOWN: Self = Self::V2_1_9;

    pub const fn from_code(code: u32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0 / 100, (self.0 / 10) % 10, self.0 % 10)
    }
}

impl Serialize for FirmwareVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_dotted_version() {
        assert_eq!(FirmwareVersion::V2_1_9.to_string(), "2.1.9");
        assert_eq!(FirmwareVersion::from_code(210).to_string(), "2.1.0");
        assert_eq!(FirmwareVersion::from_code(220).to_string(), "2.2.0");
    }

    #[test]
    fn orders_by_code() {
        assert!(FirmwareVersion::V2_1_0 < FirmwareVersion::V2_1_9);
        assert!(FirmwareVersion::from_code(220) > FirmwareVersion::LATEST_KNOWN);
    }
}
