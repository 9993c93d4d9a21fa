// ── Device handshake entity ──
//
// Holds the properties read once at connect time. The firmware version it
// learns is published to the shared `DeviceContext`, which every other
// store consults for firmware gating.

use std::sync::Arc;

use sprinkly_api::ReadEndpoint;
use tracing::{info, warn};

use crate::context::DeviceContext;
use crate::error::CoreError;
use crate::model::{FirmwareVersion, OwnerKind, PropertyKey, PropertyValue};
use crate::store::{Derivation, PropertyStore};

/// Derivation for the device entity: publishes the firmware version.
#[derive(Debug, Default)]
pub struct DeviceState;

impl Derivation for DeviceState {
    const KIND: OwnerKind = OwnerKind::Api;

    fn on_value_assigned(
        &self,
        ctx: &DeviceContext,
        key: PropertyKey,
        _old: Option<&PropertyValue>,
        new: &PropertyValue,
    ) {
        if key != PropertyKey::FirmwareVersion {
            return;
        }
        if let Some(code) = new.as_number().and_then(|n| u32::try_from(n).ok()) {
            ctx.set_firmware(FirmwareVersion::from_code(code));
        }
    }
}

/// The device itself, as seen through the options endpoint.
#[derive(Debug)]
pub struct Device {
    store: PropertyStore<DeviceState>,
}

impl Device {
    pub fn new(ctx: Arc<DeviceContext>) -> Self {
        Self {
            store: PropertyStore::new(ctx, DeviceState),
        }
    }

    /// Perform the firmware handshake.
    ///
    /// Reads the options endpoint directly (the context is marked
    /// disconnected until the handshake succeeds), records the firmware version and marks the context
    /// connected. The response must carry the version every time.
    pub async fn connect(&self) -> Result<FirmwareVersion, CoreError> {
        let ctx = self.store.context();
        // A version learned by an earlier handshake must not satisfy this one.
        ctx.set_connected(false);
        ctx.clear_firmware();
        let object = ctx
            .transport()
            .execute(ReadEndpoint::Options.into(), &[])
            .await?;
        self.store.apply_batch(&object)?;

        let firmware = ctx.firmware().ok_or(CoreError::NotConnected)?;
        info!(parent: ctx.span(), %firmware, "device firmware");
        if firmware > FirmwareVersion::LATEST_KNOWN {
            warn!(
                parent: ctx.span(),
                %firmware,
                latest_known = %FirmwareVersion::LATEST_KNOWN,
                "firmware is newer than any version this client was checked against"
            );
        }

        ctx.set_connected(true);
        Ok(firmware)
    }

    pub fn firmware(&self) -> Option<FirmwareVersion> {
        self.store.context().firmware()
    }

    pub fn store(&self) -> &PropertyStore<DeviceState> {
        &self.store
    }
}
