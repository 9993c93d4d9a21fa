// ── Station ──
//
// One output of the controller. Per-station flags live in per-board mask
// words shared by every station; this module decodes them, keeps a
// countdown to the end of the current watering run, and issues manual
// run and enable/disable writes.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use sprinkly_api::WriteEndpoint;
use tracing::{debug, warn};

use crate::context::DeviceContext;
use crate::error::CoreError;
use crate::model::{OwnerKind, PropertyKey, PropertyValue, StationSnapshot};
use crate::store::{Derivation, PropertyStore, ResponseCache};

/// Stations per expansion board.
pub const STATIONS_PER_BOARD: usize = 8;

/// Program id the device reports for manually started runs.
const MANUAL_PROGRAM_ID: i64 = 99;

// ── Bitfield decoding ───────────────────────────────────────────────

/// Board number and bit position of a station index.
pub fn board_and_bit(index: usize) -> (usize, usize) {
    (index / STATIONS_PER_BOARD, index % STATIONS_PER_BOARD)
}

/// Whether a station's bit is set in a per-board mask array. A missing
/// board reads as clear.
pub fn bit_is_set(masks: &[i64], index: usize) -> bool {
    let (board, bit) = board_and_bit(index);
    masks.get(board).is_some_and(|mask| (mask >> bit) & 1 == 1)
}

/// Copy of `masks` with a station's bit set or cleared, padded with empty
/// boards as needed.
pub fn with_bit(masks: &[i64], index: usize, on: bool) -> Vec<i64> {
    let (board, bit) = board_and_bit(index);
    let mut masks = masks.to_vec();
    if masks.len() <= board {
        masks.resize(board + 1, 0);
    }
    if let Some(mask) = masks.get_mut(board) {
        if on {
            *mask |= 1 << bit;
        } else {
            *mask &= !(1 << bit);
        }
    }
    masks
}

// ── Derivation ──────────────────────────────────────────────────────

/// Station-specific derived state: clock skew and watering end time.
#[derive(Debug)]
pub struct StationState {
    index: usize,
    /// Host clock minus device clock, seconds.
    clock_skew: AtomicI64,
    /// Host epoch seconds at which the current run ends.
    watering_end: Mutex<Option<i64>>,
}

impl StationState {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            clock_skew: AtomicI64::new(0),
            watering_end: Mutex::new(None),
        }
    }

    pub fn clock_skew(&self) -> i64 {
        self.clock_skew.load(Ordering::SeqCst)
    }

    /// End of the current run, `None` if unknown or already past.
    pub fn watering_end(&self, now: i64) -> Option<i64> {
        self.end_time().filter(|&end| end > now)
    }

    fn end_time(&self) -> Option<i64> {
        *self.watering_end.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_end_time(&self, end: Option<i64>) {
        *self.watering_end.lock().unwrap_or_else(PoisonError::into_inner) = end;
    }
}

impl Derivation for StationState {
    const KIND: OwnerKind = OwnerKind::Station;

    fn before_assign(&self, ctx: &DeviceContext, _key: PropertyKey, value: PropertyValue) -> PropertyValue {
        if self.end_time().is_some_and(|end| end <= ctx.now()) {
            self.set_end_time(None);
        }
        value
    }

    fn on_value_assigned(
        &self,
        ctx: &DeviceContext,
        key: PropertyKey,
        _old: Option<&PropertyValue>,
        new: &PropertyValue,
    ) {
        match key {
            PropertyKey::DeviceTime => {
                if let Some(device_time) = new.as_number() {
                    self.clock_skew
                        .store(ctx.now().saturating_sub(device_time), Ordering::SeqCst);
                }
            }
            PropertyKey::ProgramStatusData => {
                let entry = new.as_number_matrix().and_then(|rows| rows.get(self.index));
                // A zeroed entry leaves an earlier end time in place.
                if let Some(&[_, remaining, start, ..]) = entry.map(Vec::as_slice) {
                    if remaining != 0 && start != 0 {
                        let end = start
                            .checked_add(remaining)
                            .and_then(|end| end.checked_add(self.clock_skew()));
                        if let Some(end) = end {
                            debug!(parent: ctx.span(), station = self.index, end, "watering end time");
                            self.set_end_time(Some(end));
                        } else {
                            warn!(parent: ctx.span(), station = self.index, start, remaining, "ignoring out-of-range program status");
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

// ── Station ─────────────────────────────────────────────────────────

/// One output station of the controller.
#[derive(Debug)]
pub struct Station {
    index: usize,
    store: PropertyStore<StationState>,
}

/// Zones and stations are the same thing.
pub type Zone = Station;

impl Station {
    pub fn new(ctx: Arc<DeviceContext>, index: usize) -> Self {
        Self {
            index,
            store: PropertyStore::new(ctx, StationState::new(index)),
        }
    }

    /// Zero-based position on the controller.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn store(&self) -> &PropertyStore<StationState> {
        &self.store
    }

    pub async fn refresh(&self, cache: &mut ResponseCache) -> Result<(), CoreError> {
        self.store.refresh_all(cache).await
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn name(&self) -> Option<String> {
        self.store.with_value(PropertyKey::StationNames, |value| {
            value
                .and_then(PropertyValue::as_string_array)
                .and_then(|names| names.get(self.index))
                .cloned()
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.mask_bit(PropertyKey::StationDisabled)
    }

    pub fn is_in_use(&self) -> bool {
        self.mask_bit(PropertyKey::StationStatusBits)
    }

    /// Host epoch seconds when the current run ends, 0 if none.
    pub fn watering_end_time(&self) -> i64 {
        let now = self.store.context().now();
        self.store.derivation().watering_end(now).unwrap_or(0)
    }

    pub fn remaining_watering_seconds(&self) -> i64 {
        if !self.is_in_use() {
            return 0;
        }
        let now = self.store.context().now();
        self.store
            .derivation()
            .end_time()
            .map_or(0, |end| end.saturating_sub(now).max(0))
    }

    fn mask_bit(&self, key: PropertyKey) -> bool {
        self.store.with_value(key, |value| {
            value
                .and_then(PropertyValue::as_number_array)
                .is_some_and(|masks| bit_is_set(masks, self.index))
        })
    }

    pub fn snapshot(&self) -> StationSnapshot {
        StationSnapshot {
            index: self.index,
            name: self.name(),
            disabled: self.is_disabled(),
            in_use: self.is_in_use(),
            watering_end_time: self.watering_end_time(),
            remaining_seconds: self.remaining_watering_seconds(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Enable or disable the station.
    ///
    /// Reads the disabled mask fresh from the device and writes this
    /// station's board word only if the bit has to change.
    pub async fn set_disabled(&self, disabled: bool) -> Result<(), CoreError> {
        let key = PropertyKey::StationDisabled;
        let current = self.store.refresh_one(key).await?;
        let masks = current.as_number_array().unwrap_or_default();

        if bit_is_set(masks, self.index) == disabled {
            debug!(parent: self.store.context().span(), station = self.index, disabled, "already set");
            return Ok(());
        }

        let updated = with_bit(masks, self.index, disabled);
        let (board, _) = board_and_bit(self.index);
        let word = updated.get(board).copied().unwrap_or_default();

        self.store
            .write_params(key, &[(format!("d{board}"), word.to_string())])
            .await?;
        self.store
            .set_value_from_source(key, PropertyValue::NumberArray(updated))
    }

    /// Start a manual run of `duration` seconds, or stop the current run.
    ///
    /// The in-use bit is read fresh from the device first. On success the
    /// local status bit and program status entry are patched right away.
    /// Only this station's mirror changes; [`Controller::start_station`]
    /// also patches the controller and sibling stations.
    ///
    /// [`Controller::start_station`]: crate::Controller::start_station
    pub async fn manual_start(&self, duration: u32, stop: bool) -> Result<(), CoreError> {
        if duration == 0 && !stop {
            return Err(CoreError::InvalidDuration);
        }

        let status_key = PropertyKey::StationStatusBits;
        let status = self.store.refresh_one(status_key).await?;
        let status = status.as_number_array().unwrap_or_default();
        if bit_is_set(status, self.index) && !stop {
            return Err(CoreError::StationAlreadyRunning { index: self.index });
        }

        let (enable, seconds) = if stop { (0, 0) } else { (1, duration) };
        let params = vec![
            ("sid".to_owned(), self.index.to_string()),
            ("en".to_owned(), enable.to_string()),
            ("t".to_owned(), seconds.to_string()),
        ];
        self.store
            .write_to(WriteEndpoint::ManualStation, &params)
            .await?;

        self.store
            .set_value_from_source(status_key, PropertyValue::NumberArray(with_bit(status, self.index, !stop)))?;

        let entry = if stop {
            vec![0, 0, 0]
        } else {
            let device_now = self
                .store
                .context()
                .now()
                .saturating_sub(self.store.derivation().clock_skew());
            vec![MANUAL_PROGRAM_ID, i64::from(duration), device_now]
        };
        let mut rows = self
            .store
            .get_value(PropertyKey::ProgramStatusData)
            .and_then(|value| value.as_number_matrix().map(<[Vec<i64>]>::to_vec))
            .unwrap_or_default();
        if rows.len() <= self.index {
            rows.resize(self.index + 1, vec![0, 0, 0]);
        }
        if let Some(row) = rows.get_mut(self.index) {
            *row = entry;
        }
        self.store
            .set_value_from_source(PropertyKey::ProgramStatusData, PropertyValue::NumberMatrix(rows))?;

        if stop {
            self.store.derivation().set_end_time(None);
        }
        Ok(())
    }

    pub async fn start(&self, duration: u32) -> Result<(), CoreError> {
        self.manual_start(duration, false).await
    }

    pub async fn stop(&self) -> Result<(), CoreError> {
        self.manual_start(0, true).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};
    use sprinkly_api::{Endpoint, ReadEndpoint};

    use super::*;
    use crate::clock::ManualClock;
    use crate::model::FirmwareVersion;
    use crate::testing::{FakeTransport, connected_context, params};

    const T: i64 = 1_700_000_000;

    fn station(index: usize, transport: &Arc<FakeTransport>, clock: &Arc<ManualClock>) -> Station {
        let ctx = connected_context(Arc::clone(transport), FirmwareVersion::V2_1_9, Arc::clone(clock));
        Station::new(ctx, index)
    }

    fn object(value: Value) -> sprinkly_api::JsonObject {
        let Value::Object(object) = value else {
            unreachable!()
        };
        object
    }

    #[test]
    fn maps_index_to_board_and_bit() {
        assert_eq!(board_and_bit(0), (0, 0));
        assert_eq!(board_and_bit(7), (0, 7));
        assert_eq!(board_and_bit(8), (1, 0));
        assert_eq!(board_and_bit(15), (1, 7));
    }

    #[test]
    fn decodes_and_patches_mask_words() {
        let masks = [0b1000_0001, 0b0000_0010];
        assert!(bit_is_set(&masks, 0));
        assert!(bit_is_set(&masks, 7));
        assert!(!bit_is_set(&masks, 8));
        assert!(bit_is_set(&masks, 9));
        assert!(!bit_is_set(&masks, 17));

        assert_eq!(with_bit(&masks, 8, true), vec![0b1000_0001, 0b0000_0011]);
        assert_eq!(with_bit(&masks, 0, false), vec![0b1000_0000, 0b0000_0010]);
        assert_eq!(with_bit(&[], 10, true), vec![0, 0b100]);
    }

    #[test]
    fn reads_name_and_flags_for_its_own_index() {
        let transport = Arc::new(FakeTransport::new());
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(9, &transport, &clock);

        zone.store()
            .apply_batch(&object(json!({
                "snames": ["S01", "S02", "S03", "S04", "S05", "S06", "S07", "S08", "Front", "Back"],
                "stn_dis": [0, 0b10],
                "sbits": [0, 0b10],
            })))
            .unwrap();

        assert_eq!(zone.name().as_deref(), Some("Back"));
        assert!(zone.is_disabled());
        assert!(zone.is_in_use());
    }

    #[test]
    fn countdown_runs_to_zero_and_expires() {
        let transport = Arc::new(FakeTransport::new());
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(0, &transport, &clock);

        zone.store()
            .apply_batch(&object(json!({ "devt": T, "sbits": [1], "ps": [[99, 10, T]] })))
            .unwrap();
        assert_eq!(zone.watering_end_time(), T + 10);
        assert_eq!(zone.remaining_watering_seconds(), 10);

        clock.advance(10);
        assert_eq!(zone.remaining_watering_seconds(), 0);

        clock.advance(1);
        zone.store()
            .apply_batch(&object(json!({ "devt": T + 11, "sbits": [0], "ps": [[0, 0, 0]] })))
            .unwrap();
        assert!(!zone.is_in_use());
        assert_eq!(zone.remaining_watering_seconds(), 0);
        assert_eq!(zone.watering_end_time(), 0);
    }

    #[test]
    fn out_of_range_program_status_is_ignored() {
        let transport = Arc::new(FakeTransport::new());
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(0, &transport, &clock);
        zone.store()
            .apply_batch(&object(json!({ "devt": T - 5, "sbits": [1], "ps": [[99, 10, T]] })))
            .unwrap();

        zone.store()
            .apply_batch(&object(json!({ "ps": [[99, i64::MAX, i64::MAX]] })))
            .unwrap();

        // The earlier end time survives the bad sample.
        assert_eq!(zone.watering_end_time(), T + 15);
        assert_eq!(zone.remaining_watering_seconds(), 15);
    }

    #[test]
    fn end_time_is_shifted_by_clock_skew() {
        let transport = Arc::new(FakeTransport::new());
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(1, &transport, &clock);

        // Device clock runs 100 s behind the host.
        zone.store()
            .apply_batch(&object(json!({
                "devt": T - 100,
                "sbits": [0b10],
                "ps": [[0, 0, 0], [3, 60, T - 100]],
            })))
            .unwrap();

        assert_eq!(zone.store().derivation().clock_skew(), 100);
        assert_eq!(zone.watering_end_time(), T + 60);
        assert_eq!(zone.remaining_watering_seconds(), 60);
    }

    #[test]
    fn zeroed_entry_keeps_existing_end_time() {
        let transport = Arc::new(FakeTransport::new());
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(0, &transport, &clock);

        zone.store()
            .apply_batch(&object(json!({ "devt": T, "sbits": [1], "ps": [[99, 30, T]] })))
            .unwrap();
        zone.store()
            .apply_batch(&object(json!({ "devt": T, "sbits": [1], "ps": [[0, 0, 0]] })))
            .unwrap();

        assert_eq!(zone.watering_end_time(), T + 30);
    }

    #[tokio::test]
    async fn manual_start_on_running_station_is_refused() {
        let transport = Arc::new(
            FakeTransport::new().with_response(ReadEndpoint::ControllerVariables, json!({ "sbits": [1] })),
        );
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(0, &transport, &clock);

        let err = zone.start(120).await.unwrap_err();

        assert!(matches!(err, CoreError::StationAlreadyRunning { index: 0 }));
        assert_eq!(transport.call_count(WriteEndpoint::ManualStation), 0);
    }

    #[tokio::test]
    async fn manual_start_marks_station_in_use_immediately() {
        let transport = Arc::new(FakeTransport::new().with_response(
            ReadEndpoint::ControllerVariables,
            json!({ "devt": T, "sbits": [0, 0], "ps": [[0, 0, 0]] }),
        ));
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(10, &transport, &clock);

        zone.start(120).await.unwrap();

        assert!(zone.is_in_use());
        assert_eq!(zone.remaining_watering_seconds(), 120);
        assert_eq!(
            zone.store().get_value(PropertyKey::StationStatusBits),
            Some(PropertyValue::NumberArray(vec![0, 0b100]))
        );
        assert_eq!(
            transport.calls().last().cloned(),
            Some((
                Endpoint::Write(WriteEndpoint::ManualStation),
                params(&[("sid", "10"), ("en", "1"), ("t", "120")])
            ))
        );
    }

    #[tokio::test]
    async fn zero_duration_is_rejected_before_any_request() {
        let transport = Arc::new(FakeTransport::new());
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(0, &transport, &clock);

        let err = zone.start(0).await.unwrap_err();

        assert!(matches!(err, CoreError::InvalidDuration));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn stop_clears_the_run() {
        let transport = Arc::new(FakeTransport::new().with_response(
            ReadEndpoint::ControllerVariables,
            json!({ "devt": T, "sbits": [1], "ps": [[99, 300, T]] }),
        ));
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(0, &transport, &clock);
        zone.refresh(&mut ResponseCache::new()).await.ok();

        zone.stop().await.unwrap();

        assert!(!zone.is_in_use());
        assert_eq!(zone.remaining_watering_seconds(), 0);
        assert_eq!(zone.watering_end_time(), 0);
        assert_eq!(
            zone.store().get_value(PropertyKey::ProgramStatusData),
            Some(PropertyValue::NumberMatrix(vec![vec![0, 0, 0]]))
        );
        assert_eq!(
            transport.calls().last().map(|(_, p)| p.clone()),
            Some(params(&[("sid", "0"), ("en", "0"), ("t", "0")]))
        );
    }

    #[tokio::test]
    async fn disabling_writes_the_board_word_once() {
        let transport = Arc::new(FakeTransport::new().with_response(
            ReadEndpoint::StationNamesAndAttributes,
            json!({ "snames": [], "stn_dis": [0b1, 0b1000] }),
        ));
        let clock = Arc::new(ManualClock::new(T));
        let zone = station(8, &transport, &clock);

        zone.set_disabled(true).await.unwrap();

        assert!(zone.is_disabled());
        assert_eq!(
            transport.calls().last().cloned(),
            Some((
                Endpoint::Write(WriteEndpoint::StationNamesAndAttributes),
                params(&[("d1", "9")])
            ))
        );

        transport.set_response(
            ReadEndpoint::StationNamesAndAttributes,
            json!({ "snames": [], "stn_dis": [0b1, 0b1001] }),
        );
        zone.set_disabled(true).await.unwrap();

        assert_eq!(transport.call_count(WriteEndpoint::StationNamesAndAttributes), 1);
        assert_eq!(transport.call_count(ReadEndpoint::StationNamesAndAttributes), 2);
    }
}
