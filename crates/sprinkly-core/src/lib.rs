//! Property synchronization engine for OpenSprinkler-style irrigation
//! controllers.
//!
//! This crate keeps a typed, locally cached mirror of the device and
//! exposes validated reads, derived queries and writes:
//!
//! - **[`registry`]**: Static property metadata: value kind, read/write
//!   endpoints, supported firmware range, valid values.
//!
//! - **[`PropertyStore`]**: Typed key/value mirror shared by every entity,
//!   with the refresh ([`PropertyStore::refresh_all`]) and write
//!   ([`PropertyStore::write_value`]) protocol. Per-kind behavior is injected
//!   through a [`Derivation`] strategy.
//!
//! - **[`Controller`]** / **[`Station`]**: The controller (clock skew,
//!   station roster, enable / rain delay) and its stations (board bitfields,
//!   watering countdown, manual runs).
//!
//! - **[`Client`]**: Lifecycle facade: [`connect()`](Client::connect) does the
//!   firmware handshake and an initial pass, then a background task refreshes
//!   on a timer while holding every entity's write lock for the pass.

pub mod clock;
pub mod config;
pub mod context;
pub mod controller;
pub mod device;
pub mod error;
pub mod model;
pub mod registry;
pub mod station;
pub mod store;

mod client;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{Client, ConnectionState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use context::DeviceContext;
pub use controller::{Controller, ControllerState};
pub use device::{Device, DeviceState};
pub use error::{CoreError, Direction};
pub use station::{Station, StationState, Zone};
pub use store::{Derivation, PropertyStore, ResponseCache};

pub use model::{
    ControllerSnapshot, FirmwareVersion, OwnerKind, PropertyKey, PropertyValue, StationSnapshot,
    ValueKind,
};
pub use registry::PropertyMetadata;

// The transport seam, re-exported so consumers need only this crate.
pub use sprinkly_api::{DevicePassword, ResultCode, Transport};
