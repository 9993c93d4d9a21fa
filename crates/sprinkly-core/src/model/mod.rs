// ── Domain model ──
//
// Closed vocabularies of the property engine: which properties exist,
// what kinds of values they hold, who owns them, and how firmware
// versions are encoded.

mod firmware;
mod owner;
mod property;
mod snapshot;

pub use firmware::FirmwareVersion;
pub use owner::OwnerKind;
pub use property::{PropertyKey, PropertyValue, ValueKind};
pub(crate) use property::json_type_name;
pub use snapshot::{ControllerSnapshot, StationSnapshot};
