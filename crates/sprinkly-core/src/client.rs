// ── Client lifecycle ──
//
// Owns one device connection: the firmware handshake, the initial and
// periodic refresh passes, and the write lock that every pass holds.
// Cheaply cloneable via `Arc<ClientInner>`.

use std::sync::Arc;
use std::time::Duration;

use sprinkly_api::DeviceClient;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use crate::config::ClientConfig;
use crate::context::DeviceContext;
use crate::controller::Controller;
use crate::device::Device;
use crate::error::CoreError;
use crate::model::{ControllerSnapshot, FirmwareVersion};
use crate::station::Station;
use crate::store::ResponseCache;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Client ───────────────────────────────────────────────────────

/// The main entry point for consumers.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ClientConfig,
    context: Arc<DeviceContext>,
    device: Device,
    controller: Controller,
    connection_state: watch::Sender<ConnectionState>,
    /// Serializes refresh passes.
    refresh_gate: Mutex<()>,
    cancel: CancellationToken,
    /// Child token for the current connection, replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Client {
    /// Create a client talking HTTP to `config.url`. Does NOT connect.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let transport = DeviceClient::new(
            config.url.clone(),
            config.password.clone(),
            &config.transport(),
        )?;
        let context = DeviceContext::new(Arc::new(transport))
            .with_unlock_timeout(config.unlock_timeout)
            .with_span(info_span!("device", url = %config.url));
        Ok(Self::with_context(config, Arc::new(context)))
    }

    /// Create a client over an existing context (custom transport or clock).
    pub fn with_context(config: ClientConfig, context: Arc<DeviceContext>) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ClientInner {
                device: Device::new(Arc::clone(&context)),
                controller: Controller::new(Arc::clone(&context)),
                config,
                context,
                connection_state,
                refresh_gate: Mutex::new(()),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.inner.context
    }

    pub fn device(&self) -> &Device {
        &self.inner.device
    }

    pub fn controller(&self) -> &Controller {
        &self.inner.controller
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the device.
    ///
    /// Reads the firmware version, performs an initial refresh pass, and
    /// spawns the periodic refresh task unless the polling interval is 0.
    /// On failure the client stays unusable until `connect` is retried.
    /// Connecting again replaces the refresh task of the earlier connection.
    pub async fn connect(&self) -> Result<FirmwareVersion, CoreError> {
        self.stop_tasks().await;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let firmware = match self.inner.device.connect().await {
            Ok(firmware) => firmware,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e);
            }
        };

        if let Err(e) = self.full_refresh().await {
            self.inner.context.set_connected(false);
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(e);
        }

        // Fresh child token for this connection (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let interval = self.inner.config.polling_interval;
        if !interval.is_zero() {
            let client = self.clone();
            self.inner
                .task_handles
                .lock()
                .await
                .push(tokio::spawn(refresh_task(client, interval, child)));
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(
            parent: self.inner.context.span(),
            %firmware,
            stations = self.inner.controller.stations().len(),
            "connected"
        );
        Ok(firmware)
    }

    /// Stop background tasks and mark the client disconnected.
    pub async fn disconnect(&self) {
        self.stop_tasks().await;
        self.inner.context.set_connected(false);
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!(parent: self.inner.context.span(), "disconnected");
    }

    /// Cancel the current connection's tasks and wait for them to exit.
    async fn stop_tasks(&self) {
        // Cancel the child token (not the parent, so reconnect works).
        self.inner.cancel_child.lock().await.cancel();

        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Run one refresh pass over the controller and every station.
    ///
    /// All stores are locked for the duration of the pass, so writes
    /// issued meanwhile wait for it to finish.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let _gate = self.inner.refresh_gate.lock().await;
        let _lock = RefreshLock::acquire(&self.inner.device, &self.inner.controller);

        let mut cache = ResponseCache::new();
        self.inner.controller.refresh(&mut cache).await?;
        debug!(
            parent: self.inner.context.span(),
            endpoints = cache.len(),
            "refresh pass complete"
        );
        Ok(())
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Periodic refresh is disabled since only one exchange is needed.
    pub async fn oneshot<F, Fut, T>(config: ClientConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Client) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.polling_interval = Duration::ZERO;

        let client = Client::new(cfg)?;
        client.connect().await?;
        let result = f(client.clone()).await;
        client.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.inner.controller.snapshot()
    }

    pub fn stations(&self) -> Arc<Vec<Arc<Station>>> {
        self.inner.controller.stations()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.controller.is_enabled()
    }

    /// Enable or disable operation of the whole controller.
    pub async fn set_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        self.inner
            .controller
            .set_enabled(enabled)
            .await
            .inspect_err(|e| {
                warn!(parent: self.inner.context.span(), error = %e, enabled, "failed to set enabled state");
            })
    }
}

// ── Refresh lock guard ───────────────────────────────────────────

/// Holds the write lock on the device, the controller and its stations
/// for one pass. Released on drop, including on error or panic.
struct RefreshLock<'a> {
    device: &'a Device,
    controller: &'a Controller,
}

impl<'a> RefreshLock<'a> {
    fn acquire(device: &'a Device, controller: &'a Controller) -> Self {
        device.store().lock(true);
        controller.lock_all(true);
        Self { device, controller }
    }
}

impl Drop for RefreshLock<'_> {
    fn drop(&mut self) {
        self.controller.lock_all(false);
        self.device.store().lock(false);
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically run a full refresh until cancelled.
async fn refresh_task(client: Client, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = client.full_refresh().await {
                    warn!(parent: client.inner.context.span(), error = %e, "periodic refresh failed");
                }
            }
        }
    }
}
