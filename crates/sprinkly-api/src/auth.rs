// Shared-secret handling.
//
// The device authenticates every request with a `pw` query parameter
// holding the MD5 hex digest of the device password.

use md5::{Digest, Md5};
use secrecy::{ExposeSecret, SecretString};

/// The device password as sent on the wire (already hashed).
#[derive(Debug, Clone)]
pub struct DevicePassword(SecretString);

impl DevicePassword {
    /// Hash a plaintext password into its wire form.
    pub fn from_plain(plain: &str) -> Self {
        let digest = Md5::digest(plain.as_bytes());
        Self(SecretString::from(format!("{digest:x}")))
    }

    /// Wrap a password that is already an MD5 hex digest.
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(SecretString::from(hash.into()))
    }

    /// The hashed secret, for building the request query.
    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for DevicePassword {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for DevicePassword {}
