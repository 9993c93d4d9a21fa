use serde::Serialize;

use super::FirmwareVersion;

/// Point-in-time view of a station, for display and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationSnapshot {
    pub index: usize,
    pub name: Option<String>,
    pub disabled: bool,
    pub in_use: bool,
    /// Host epoch seconds; 0 when no run is active.
    pub watering_end_time: i64,
    pub remaining_seconds: i64,
}

/// Point-in-time view of the controller and its roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub firmware: Option<FirmwareVersion>,
    /// Device clock, epoch seconds.
    pub device_time: i64,
    pub enabled: bool,
    pub rain_delay_active: bool,
    pub any_station_active: bool,
    pub stations: Vec<StationSnapshot>,
}
