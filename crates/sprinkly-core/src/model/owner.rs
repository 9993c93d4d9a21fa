use serde::Serialize;
use strum::Display;

/// Which metadata table applies to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// The device handshake entity (firmware version).
    Api,
    Controller,
    /// An output station, also called a zone.
    Station,
}

impl OwnerKind {
    /// Every kind, in the order cross-owner lookups search them.
    pub const ALL: [Self; 3] = [Self::Api, Self::Controller, Self::Station];
}
