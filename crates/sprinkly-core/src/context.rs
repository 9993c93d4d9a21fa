// ── Device context ──
//
// State shared by every entity of one device: the transport, the host
// clock, the firmware version learned during connect, and the tracing
// span that scopes this device's log output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use sprinkly_api::{JsonObject, ReadEndpoint, Transport, WriteEndpoint};
use tracing::Span;

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::model::FirmwareVersion;

/// Shared per-device state, handed to every store as `Arc<DeviceContext>`.
pub struct DeviceContext {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    /// Firmware code, 0 until the handshake succeeds.
    firmware: AtomicU32,
    connected: AtomicBool,
    unlock_timeout: Duration,
    span: Span,
}

impl DeviceContext {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            clock: Arc::new(SystemClock),
            firmware: AtomicU32::new(0),
            connected: AtomicBool::new(false),
            unlock_timeout: Duration::from_secs(5),
            span: Span::none(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_unlock_timeout(mut self, timeout: Duration) -> Self {
        self.unlock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Firmware reported by the device, `None` before connect.
    pub fn firmware(&self) -> Option<FirmwareVersion> {
        match self.firmware.load(Ordering::SeqCst) {
            0 => None,
            code => Some(FirmwareVersion::from_code(code)),
        }
    }

    pub(crate) fn set_firmware(&self, firmware: FirmwareVersion) {
        self.firmware.store(firmware.code(), Ordering::SeqCst);
    }

    pub(crate) fn clear_firmware(&self) {
        self.firmware.store(0, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Host time, epoch seconds.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub fn unlock_timeout(&self) -> Duration {
        self.unlock_timeout
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Read one endpoint. Both directions refuse before the handshake
    /// has completed.
    pub(crate) async fn fetch(&self, endpoint: ReadEndpoint) -> Result<JsonObject, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::NotConnected);
        }
        Ok(self.transport.execute(endpoint.into(), &[]).await?)
    }

    pub(crate) async fn send(
        &self,
        endpoint: WriteEndpoint,
        params: &[(String, String)],
    ) -> Result<JsonObject, CoreError> {
        if !self.is_connected() {
            return Err(CoreError::NotConnected);
        }
        Ok(self.transport.execute(endpoint.into(), params).await?)
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("firmware", &self.firmware())
            .field("connected", &self.is_connected())
            .field("unlock_timeout", &self.unlock_timeout)
            .finish_non_exhaustive()
    }
}
