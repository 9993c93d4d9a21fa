// ── Typed property mirror ──
//
// One `PropertyStore` per entity. Values are only ever stored with the
// kind their metadata declares. Per-kind side effects (clock skew,
// watering timers, enum clamping) are supplied by a `Derivation`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use sprinkly_api::{JsonObject, WriteEndpoint};
use tracing::{debug, trace, warn};

use super::write_lock::WriteLock;
use crate::context::DeviceContext;
use crate::error::{CoreError, Direction};
use crate::model::{OwnerKind, PropertyKey, PropertyValue, json_type_name};
use crate::registry::{self, PropertyMetadata};

type ValueMap = HashMap<PropertyKey, PropertyValue>;

/// Per-kind behavior plugged into a [`PropertyStore`].
///
/// Both hooks run while the store's value map is locked for writing and
/// must not call back into the store.
pub trait Derivation: Send + Sync + 'static {
    /// Which metadata table the store consults.
    const KIND: OwnerKind;

    /// Inspect or rewrite a type-checked value before the valid-value
    /// check and assignment.
    fn before_assign(
        &self,
        _ctx: &DeviceContext,
        _key: PropertyKey,
        value: PropertyValue,
    ) -> PropertyValue {
        value
    }

    /// Called after a value has been stored.
    fn on_value_assigned(
        &self,
        _ctx: &DeviceContext,
        _key: PropertyKey,
        _old: Option<&PropertyValue>,
        _new: &PropertyValue,
    ) {
    }
}

/// Typed key/value mirror of one entity on the device.
pub struct PropertyStore<D: Derivation> {
    ctx: Arc<DeviceContext>,
    values: RwLock<ValueMap>,
    lock: WriteLock,
    derivation: D,
}

impl<D: Derivation> PropertyStore<D> {
    pub fn new(ctx: Arc<DeviceContext>, derivation: D) -> Self {
        Self {
            ctx,
            values: RwLock::new(HashMap::new()),
            lock: WriteLock::new(),
            derivation,
        }
    }

    pub fn kind(&self) -> OwnerKind {
        D::KIND
    }

    pub fn context(&self) -> &Arc<DeviceContext> {
        &self.ctx
    }

    pub fn derivation(&self) -> &D {
        &self.derivation
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current mirrored value, `None` if never populated.
    pub fn get_value(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Borrow a value without cloning it.
    pub fn with_value<R>(&self, key: PropertyKey, f: impl FnOnce(Option<&PropertyValue>) -> R) -> R {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        f(values.get(&key))
    }

    // ── Assignment ───────────────────────────────────────────────────

    /// Assign a value reported by the device (or confirmed by a write).
    ///
    /// Fails with [`CoreError::InvalidConversion`] on a kind mismatch.
    /// A value outside the declared valid set is logged and dropped.
    pub fn set_value_from_source(&self, key: PropertyKey, value: PropertyValue) -> Result<(), CoreError> {
        let mut values = self.write_values();
        self.assign(&mut values, key, value)
    }

    /// Apply every recognized pair of a device JSON object as one batch.
    ///
    /// Keys this owner kind does not declare are skipped. The first
    /// conversion failure aborts the rest of the batch; pairs applied
    /// before it stay applied.
    pub fn apply_batch(&self, object: &JsonObject) -> Result<(), CoreError> {
        let mut values = self.write_values();
        for (name, json) in object {
            let Ok(key) = name.parse::<PropertyKey>() else {
                continue;
            };
            let Some(meta) = registry::metadata_for(D::KIND, key) else {
                continue;
            };
            let value = PropertyValue::from_json(meta.value_kind, json).ok_or_else(|| {
                CoreError::InvalidConversion {
                    key,
                    expected: meta.value_kind,
                    found: json_type_name(json).to_owned(),
                }
            })?;
            self.assign(&mut values, key, value)?;
        }
        Ok(())
    }

    fn assign(&self, values: &mut ValueMap, key: PropertyKey, value: PropertyValue) -> Result<(), CoreError> {
        let Some(meta) = registry::metadata_for(D::KIND, key) else {
            trace!(parent: self.ctx.span(), owner = %D::KIND, %key, "ignoring undeclared property");
            return Ok(());
        };

        if value.kind() != meta.value_kind {
            return Err(CoreError::InvalidConversion {
                key,
                expected: meta.value_kind,
                found: value.kind().to_string(),
            });
        }

        let value = self.derivation.before_assign(&self.ctx, key, value);

        if !meta.accepts(&value) {
            debug!(
                parent: self.ctx.span(),
                owner = %D::KIND,
                %key,
                value = %value.to_param(),
                "discarding value outside the valid set"
            );
            return Ok(());
        }

        let old = values.remove(&key);
        let new = values.entry(key).or_insert(value);
        self.derivation.on_value_assigned(&self.ctx, key, old.as_ref(), new);
        Ok(())
    }

    fn write_values(&self) -> RwLockWriteGuard<'_, ValueMap> {
        self.values.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Write a value to the device, then mirror it locally.
    ///
    /// Checks firmware support, value kind and valid values before any
    /// request is made, and waits for an in-flight refresh to finish.
    pub async fn write_value(&self, key: PropertyKey, value: PropertyValue) -> Result<(), CoreError> {
        let meta = check_firmware(&self.ctx, key)?;

        if value.kind() != meta.value_kind {
            return Err(CoreError::InvalidConversion {
                key,
                expected: meta.value_kind,
                found: value.kind().to_string(),
            });
        }
        if !meta.accepts(&value) {
            return Err(CoreError::OutOfRange {
                key,
                value: value.to_param(),
            });
        }

        let params = vec![(key.wire_name().to_owned(), value.to_param())];
        self.write_params(key, &params).await?;
        self.set_value_from_source(key, value)
    }

    /// Send pre-built parameters to `key`'s write endpoint.
    ///
    /// Used where the wire form differs from the mirrored value, such as
    /// a single per-board mask word. Does not touch the local mirror.
    pub(crate) async fn write_params(
        &self,
        key: PropertyKey,
        params: &[(String, String)],
    ) -> Result<(), CoreError> {
        check_firmware(&self.ctx, key)?;
        self.wait_for_unlock().await;
        let endpoint = registry::metadata_for(D::KIND, key)
            .and_then(|m| m.write_endpoint)
            .ok_or(CoreError::InvalidEndpoint {
                key,
                direction: Direction::Write,
            })?;
        self.send(endpoint, params).await
    }

    /// Send parameters to an explicit write endpoint once the lock clears.
    pub(crate) async fn write_to(
        &self,
        endpoint: WriteEndpoint,
        params: &[(String, String)],
    ) -> Result<(), CoreError> {
        self.wait_for_unlock().await;
        self.send(endpoint, params).await
    }

    async fn send(&self, endpoint: WriteEndpoint, params: &[(String, String)]) -> Result<(), CoreError> {
        debug!(parent: self.ctx.span(), owner = %D::KIND, %endpoint, ?params, "writing");
        self.ctx.send(endpoint, params).await?;
        Ok(())
    }

    // ── Write lock ───────────────────────────────────────────────────

    /// Set or clear the refresh lock. Clearing wakes waiting writers.
    pub fn lock(&self, locked: bool) {
        self.lock.set(locked);
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    async fn wait_for_unlock(&self) {
        let timeout = self.ctx.unlock_timeout();
        if !self.lock.wait_for_unlock(timeout).await {
            warn!(
                parent: self.ctx.span(),
                owner = %D::KIND,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "refresh lock not released in time, forcing it open"
            );
        }
    }
}

/// Resolve `key`'s metadata from any owner kind and gate on firmware.
fn check_firmware(ctx: &DeviceContext, key: PropertyKey) -> Result<&'static PropertyMetadata, CoreError> {
    let firmware = ctx.firmware().ok_or(CoreError::NotConnected)?;
    let meta = registry::metadata_across_owners(key).ok_or(CoreError::InvalidEndpoint {
        key,
        direction: Direction::Write,
    })?;
    if !meta.supports(firmware) {
        return Err(CoreError::NotSupportedByFirmware { key, firmware });
    }
    Ok(meta)
}

impl<D: Derivation> std::fmt::Debug for PropertyStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("kind", &D::KIND)
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}
