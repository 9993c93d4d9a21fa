// ── Runtime connection configuration ──
//
// Describes how to reach one device. Carries the hashed shared secret and
// timing knobs, but never touches disk: the CLI builds a `ClientConfig`
// from its profile and hands it in.

use std::time::Duration;

use sprinkly_api::{DevicePassword, TransportConfig};
use url::Url;

/// Configuration for connecting to a single device.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Device root URL (e.g., `http://192.168.1.20:8080`).
    pub url: Url,
    pub password: DevicePassword,
    /// Request timeout.
    pub timeout: Duration,
    /// How often the background task refreshes. Zero disables it.
    pub polling_interval: Duration,
    /// How long a write waits for an in-flight refresh before forcing
    /// the lock open.
    pub unlock_timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: Url, password: DevicePassword) -> Self {
        Self {
            url,
            password,
            timeout: Duration::from_secs(30),
            polling_interval: Duration::from_secs(30),
            unlock_timeout: Duration::from_secs(5),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            ..TransportConfig::default()
        }
    }
}
