// ── Controller ──
//
// The controller entity: device clock skew, enable / rain-delay state, and
// the station roster. The roster grows when the reported board count
// implies more stations than exist and is never shrunk.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use arc_swap::ArcSwap;
use tracing::{debug, info, warn};

use crate::context::DeviceContext;
use crate::error::CoreError;
use crate::model::{ControllerSnapshot, OwnerKind, PropertyKey, PropertyValue};
use crate::station::{STATIONS_PER_BOARD, Station, with_bit};
use crate::store::{Derivation, PropertyStore, ResponseCache};

/// Main board plus the largest expansion chain the firmware drives.
pub const MAX_BOARDS: usize = 25;

// ── Derivation ──────────────────────────────────────────────────────

/// Controller-specific derived state.
#[derive(Debug, Default)]
pub struct ControllerState {
    /// Host clock minus device clock, seconds.
    clock_skew: AtomicI64,
    /// Station count implied by the last board count sample.
    expected_stations: AtomicUsize,
}

impl ControllerState {
    pub fn clock_skew(&self) -> i64 {
        self.clock_skew.load(Ordering::SeqCst)
    }

    pub fn expected_stations(&self) -> usize {
        self.expected_stations.load(Ordering::SeqCst)
    }
}

impl Derivation for ControllerState {
    const KIND: OwnerKind = OwnerKind::Controller;

    fn before_assign(&self, _ctx: &DeviceContext, key: PropertyKey, value: PropertyValue) -> PropertyValue {
        match (key, value) {
            // Rain delay is mirrored as a flag, whatever the hour count.
            (PropertyKey::RainDelay, PropertyValue::Number(hours)) => {
                PropertyValue::Number(i64::from(hours >= 1))
            }
            (_, value) => value,
        }
    }

    fn on_value_assigned(
        &self,
        ctx: &DeviceContext,
        key: PropertyKey,
        _old: Option<&PropertyValue>,
        new: &PropertyValue,
    ) {
        match (key, new.as_number()) {
            (PropertyKey::DeviceTime, Some(device_time)) => {
                let skew = ctx.now().saturating_sub(device_time);
                self.clock_skew.store(skew, Ordering::SeqCst);
                debug!(parent: ctx.span(), skew, "clock skew");
            }
            (PropertyKey::NumberOfBoards, Some(boards)) => {
                match usize::try_from(boards).ok().filter(|b| *b <= MAX_BOARDS) {
                    Some(boards) => self
                        .expected_stations
                        .store(boards * STATIONS_PER_BOARD, Ordering::SeqCst),
                    None => warn!(parent: ctx.span(), boards, "ignoring implausible board count"),
                }
            }
            _ => {}
        }
    }
}

// ── Controller ──────────────────────────────────────────────────────

/// The irrigation controller and its stations.
pub struct Controller {
    store: PropertyStore<ControllerState>,
    stations: ArcSwap<Vec<Arc<Station>>>,
}

impl Controller {
    pub fn new(ctx: Arc<DeviceContext>) -> Self {
        Self {
            store: PropertyStore::new(ctx, ControllerState::default()),
            stations: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn store(&self) -> &PropertyStore<ControllerState> {
        &self.store
    }

    /// Refresh the controller, then every station, sharing `cache`.
    ///
    /// Stations implied by a new board count are created and refreshed
    /// once the controller's own values are in.
    pub async fn refresh(&self, cache: &mut ResponseCache) -> Result<(), CoreError> {
        self.store.refresh_all(cache).await?;
        for station in self.stations.load_full().iter() {
            station.refresh(cache).await?;
        }
        self.grow_roster(cache).await
    }

    /// Append the stations missing from the roster, each refreshed before
    /// it becomes visible. A failure leaves the roster unchanged.
    async fn grow_roster(&self, cache: &mut ResponseCache) -> Result<(), CoreError> {
        let expected = self.store.derivation().expected_stations();
        let current = self.stations.load().len();
        if expected <= current {
            return Ok(());
        }

        info!(
            parent: self.store.context().span(),
            boards = expected / STATIONS_PER_BOARD,
            stations = expected,
            "found station boards, adding stations"
        );

        let mut added = Vec::with_capacity(expected - current);
        for index in current..expected {
            debug!(parent: self.store.context().span(), index, "adding station");
            let station = Station::new(Arc::clone(self.store.context()), index);
            station.refresh(cache).await?;
            added.push(Arc::new(station));
        }

        self.stations.rcu(|old| {
            let mut next = Vec::clone(old);
            next.extend(added.iter().filter(|s| s.index() >= old.len()).cloned());
            next
        });
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Device clock estimated from the host clock and the last skew sample.
    pub fn current_device_time(&self) -> i64 {
        self.store
            .context()
            .now()
            .saturating_sub(self.store.derivation().clock_skew())
    }

    pub fn is_enabled(&self) -> bool {
        self.number(PropertyKey::OperationEnable) == Some(1)
    }

    pub fn is_rain_delay_active(&self) -> bool {
        self.number(PropertyKey::RainDelay) == Some(1)
    }

    pub fn is_any_station_active(&self) -> bool {
        self.store.with_value(PropertyKey::StationStatusBits, |value| {
            value
                .and_then(PropertyValue::as_number_array)
                .is_some_and(|masks| masks.iter().any(|m| *m != 0))
        })
    }

    fn number(&self, key: PropertyKey) -> Option<i64> {
        self.store
            .with_value(key, |value| value.and_then(PropertyValue::as_number))
    }

    /// The station roster in index order.
    pub fn stations(&self) -> Arc<Vec<Arc<Station>>> {
        self.stations.load_full()
    }

    /// Stations that are not disabled.
    pub fn active_stations(&self) -> Vec<Arc<Station>> {
        self.stations
            .load()
            .iter()
            .filter(|s| !s.is_disabled())
            .cloned()
            .collect()
    }

    pub fn station_by_index(&self, index: usize) -> Option<Arc<Station>> {
        self.stations.load().get(index).cloned()
    }

    pub fn station_by_name(&self, name: &str) -> Option<Arc<Station>> {
        self.stations
            .load()
            .iter()
            .find(|s| s.name().as_deref() == Some(name))
            .cloned()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            firmware: self.store.context().firmware(),
            device_time: self.current_device_time(),
            enabled: self.is_enabled(),
            rain_delay_active: self.is_rain_delay_active(),
            any_station_active: self.is_any_station_active(),
            stations: self.stations.load().iter().map(|s| s.snapshot()).collect(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Set a rain delay of `hours`; 0 clears it.
    pub async fn set_rain_delay(&self, hours: u32) -> Result<(), CoreError> {
        self.store
            .write_value(PropertyKey::RainDelay, PropertyValue::Number(i64::from(hours)))
            .await
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        self.store
            .write_value(
                PropertyKey::OperationEnable,
                PropertyValue::Number(i64::from(enabled)),
            )
            .await
    }

    /// Start a manual run on `station`. The in-use bit is mirrored to the
    /// controller and every other station as soon as the device accepts.
    pub async fn start_station(&self, station: &Station, duration: u32) -> Result<(), CoreError> {
        station.start(duration).await?;
        self.mirror_status_bit(station.index(), true)
    }

    pub async fn stop_station(&self, station: &Station) -> Result<(), CoreError> {
        station.stop().await?;
        self.mirror_status_bit(station.index(), false)
    }

    fn mirror_status_bit(&self, index: usize, on: bool) -> Result<(), CoreError> {
        let key = PropertyKey::StationStatusBits;
        let patched = |value: Option<PropertyValue>| {
            let masks = value
                .as_ref()
                .and_then(PropertyValue::as_number_array)
                .unwrap_or_default();
            PropertyValue::NumberArray(with_bit(masks, index, on))
        };

        self.store
            .set_value_from_source(key, patched(self.store.get_value(key)))?;
        for sibling in self.stations.load().iter().filter(|s| s.index() != index) {
            sibling
                .store()
                .set_value_from_source(key, patched(sibling.store().get_value(key)))?;
        }
        Ok(())
    }

    /// Set or clear the refresh lock on the controller and every station.
    pub fn lock_all(&self, locked: bool) {
        self.store.lock(locked);
        for station in self.stations.load().iter() {
            station.store().lock(locked);
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("store", &self.store)
            .field("stations", &self.stations.load().len())
            .finish()
    }
}
