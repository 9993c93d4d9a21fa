// ── Property store ──
//
// The generic entity every addressable part of the device is built on:
// a typed key/value mirror, the write path gated by firmware and the
// write lock, and the coalesced refresh path.

mod property_store;
mod refresh;
mod write_lock;

pub use property_store::{Derivation, PropertyStore};
pub use refresh::ResponseCache;
