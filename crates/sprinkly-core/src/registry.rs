//! Property metadata registry.
//!
//! A compiled-in table describing every known property: its value kind,
//! the endpoints that carry it, the firmware range that supports it and,
//! optionally, the values it may legally hold. Indexed by
//! ([`OwnerKind`], [`PropertyKey`]).
//!
//! A property with no read endpoint is never populated by a refresh; a
//! property with no write endpoint is never written.

use sprinkly_api::{ReadEndpoint, WriteEndpoint};

use crate::model::{FirmwareVersion, OwnerKind, PropertyKey, PropertyValue, ValueKind};

/// Immutable description of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub key: PropertyKey,
    pub read_endpoint: Option<ReadEndpoint>,
    pub write_endpoint: Option<WriteEndpoint>,
    pub minimum_firmware: FirmwareVersion,
    /// `None` means no upper bound.
    pub maximum_firmware: Option<FirmwareVersion>,
    pub value_kind: ValueKind,
    pub valid_values: Option<&'static [i64]>,
}

impl PropertyMetadata {
    const fn new(key: PropertyKey, value_kind: ValueKind) -> Self {
        Self {
            key,
            read_endpoint: None,
            write_endpoint: None,
            minimum_firmware: FirmwareVersion::V2_1_0,
            maximum_firmware: None,
            value_kind,
            valid_values: None,
        }
    }

    const fn read_from(mut self, endpoint: ReadEndpoint) -> Self {
        self.read_endpoint = Some(endpoint);
        self
    }

    const fn write_to(mut self, endpoint: WriteEndpoint) -> Self {
        self.write_endpoint = Some(endpoint);
        self
    }

    const fn valid(mut self, values: &'static [i64]) -> Self {
        self.valid_values = Some(values);
        self
    }

    /// Inclusive firmware range check.
    pub fn supports(&self, firmware: FirmwareVersion) -> bool {
        firmware >= self.minimum_firmware
            && self.maximum_firmware.is_none_or(|max| firmware <= max)
    }

    /// Whether `value` is a member of the declared valid set (if any).
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self.valid_values, value) {
            (None, _) => true,
            (Some(valid), PropertyValue::Number(n)) => valid.contains(n),
            (Some(_), _) => false,
        }
    }
}

// ── Property definitions ────────────────────────────────────────────

pub const FIRMWARE_VERSION: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::FirmwareVersion, ValueKind::Number)
        .read_from(ReadEndpoint::Options);

pub const DEVICE_TIME: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::DeviceTime, ValueKind::Number)
        .read_from(ReadEndpoint::ControllerVariables);

pub const NUMBER_OF_BOARDS: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::NumberOfBoards, ValueKind::Number)
        .read_from(ReadEndpoint::ControllerVariables);

pub const OPERATION_ENABLE: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::OperationEnable, ValueKind::Number)
        .read_from(ReadEndpoint::ControllerVariables)
        .write_to(WriteEndpoint::ControllerVariables)
        .valid(&[0, 1]);

/// One in-use mask word per board.
pub const STATION_STATUS_BITS: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::StationStatusBits, ValueKind::NumberArray)
        .read_from(ReadEndpoint::ControllerVariables);

/// Rain delay, in hours when written; normalized to 0/1 when mirrored.
pub const RAIN_DELAY: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::RainDelay, ValueKind::Number)
        .read_from(ReadEndpoint::ControllerVariables)
        .write_to(WriteEndpoint::ControllerVariables);

pub const STATION_NAMES: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::StationNames, ValueKind::StringArray)
        .read_from(ReadEndpoint::StationNamesAndAttributes);

/// Per-station `[program id, remaining seconds, start timestamp]` rows.
pub const PROGRAM_STATUS_DATA: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::ProgramStatusData, ValueKind::NumberMatrix)
        .read_from(ReadEndpoint::ControllerVariables);

/// One disabled mask word per board.
pub const STATION_DISABLED: PropertyMetadata =
    PropertyMetadata::new(PropertyKey::StationDisabled, ValueKind::NumberArray)
        .read_from(ReadEndpoint::StationNamesAndAttributes)
        .write_to(WriteEndpoint::StationNamesAndAttributes);

// ── Per-owner tables ────────────────────────────────────────────────

const API_PROPERTIES: &[&PropertyMetadata] = &[&FIRMWARE_VERSION];

const CONTROLLER_PROPERTIES: &[&PropertyMetadata] = &[
    &DEVICE_TIME,
    &NUMBER_OF_BOARDS,
    &OPERATION_ENABLE,
    &STATION_STATUS_BITS,
    &RAIN_DELAY,
];

const STATION_PROPERTIES: &[&PropertyMetadata] = &[
    &DEVICE_TIME,
    &STATION_NAMES,
    &STATION_DISABLED,
    &STATION_STATUS_BITS,
    &PROGRAM_STATUS_DATA,
];

/// All properties declared for an owner kind, in declaration order.
pub fn properties_for(kind: OwnerKind) -> &'static [&'static PropertyMetadata] {
    match kind {
        OwnerKind::Api => API_PROPERTIES,
        OwnerKind::Controller => CONTROLLER_PROPERTIES,
        OwnerKind::Station => STATION_PROPERTIES,
    }
}

pub fn metadata_for(kind: OwnerKind, key: PropertyKey) -> Option<&'static PropertyMetadata> {
    properties_for(kind).iter().copied().find(|m| m.key == key)
}

/// Distinct read endpoints an owner kind needs for a full refresh,
/// in first-declared order.
pub fn read_endpoints_for(kind: OwnerKind) -> Vec<ReadEndpoint> {
    let mut endpoints = Vec::new();
    for endpoint in properties_for(kind).iter().filter_map(|m| m.read_endpoint) {
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }
    endpoints
}

/// Flat search over every owner kind, first match wins.
///
/// Used for firmware gating from owners that do not declare the key
/// themselves. Keys shared between kinds reuse one definition, so every
/// match carries the same firmware range.
pub fn metadata_across_owners(key: PropertyKey) -> Option<&'static PropertyMetadata> {
    OwnerKind::ALL
        .iter()
        .find_map(|&kind| metadata_for(kind, key))
}
