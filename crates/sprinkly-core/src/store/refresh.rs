// ── Refresh path ──
//
// A refresh pass hands one `ResponseCache` from owner to owner so each
// distinct read endpoint is fetched at most once per pass. Values from
// one endpoint response are applied to an owner as a single batch.

use std::collections::HashMap;

use sprinkly_api::{JsonObject, ReadEndpoint};
use tracing::{debug, trace};

use super::property_store::{Derivation, PropertyStore};
use crate::error::{CoreError, Direction};
use crate::model::{PropertyKey, PropertyValue};
use crate::registry;

/// Endpoint responses gathered during one refresh pass.
#[derive(Debug, Default)]
pub struct ResponseCache {
    responses: HashMap<ReadEndpoint, JsonObject>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, endpoint: ReadEndpoint) -> Option<&JsonObject> {
        self.responses.get(&endpoint)
    }

    pub fn contains(&self, endpoint: ReadEndpoint) -> bool {
        self.responses.contains_key(&endpoint)
    }

    pub fn insert(&mut self, endpoint: ReadEndpoint, object: JsonObject) {
        self.responses.insert(endpoint, object);
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

impl<D: Derivation> PropertyStore<D> {
    /// Refresh every property this owner reads, reusing responses already
    /// in `cache` and adding the ones fetched here.
    ///
    /// The first failing endpoint aborts the rest of this owner's refresh.
    pub async fn refresh_all(&self, cache: &mut ResponseCache) -> Result<(), CoreError> {
        for endpoint in registry::read_endpoints_for(D::KIND) {
            if cache.contains(endpoint) {
                trace!(parent: self.context().span(), owner = %D::KIND, %endpoint, "reusing cached response");
            } else {
                let object = self.context().fetch(endpoint).await?;
                debug!(
                    parent: self.context().span(),
                    owner = %D::KIND,
                    %endpoint,
                    keys = object.len(),
                    "fetched"
                );
                cache.insert(endpoint, object);
            }

            if let Some(object) = cache.get(endpoint) {
                self.apply_batch(object)?;
            }
        }
        Ok(())
    }

    /// Fetch `key`'s read endpoint (never cached), apply it, and return
    /// the resulting value.
    pub async fn refresh_one(&self, key: PropertyKey) -> Result<PropertyValue, CoreError> {
        let endpoint = registry::metadata_for(D::KIND, key)
            .and_then(|m| m.read_endpoint)
            .ok_or(CoreError::InvalidEndpoint {
                key,
                direction: Direction::Read,
            })?;

        let object = self.context().fetch(endpoint).await?;
        self.apply_batch(&object)?;
        self.get_value(key).ok_or(CoreError::ValueMissing { key })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::clock::ManualClock;
    use crate::model::{FirmwareVersion, OwnerKind};
    use crate::testing::{FakeTransport, connected_context};

    struct ControllerKind;
    impl Derivation for ControllerKind {
        const KIND: OwnerKind = OwnerKind::Controller;
    }

    struct StationKind;
    impl Derivation for StationKind {
        const KIND: OwnerKind = OwnerKind::Station;
    }

    fn device() -> Arc<FakeTransport> {
        Arc::new(
            FakeTransport::new()
                .with_response(
                    ReadEndpoint::ControllerVariables,
                    json!({ "devt": 1_000, "nbrd": 1, "en": 1, "sbits": [0], "rd": 0, "ps": [[0, 0, 0]] }),
                )
                .with_response(
                    ReadEndpoint::StationNamesAndAttributes,
                    json!({ "snames": ["Lawn"], "stn_dis": [0] }),
                ),
        )
    }

    #[tokio::test]
    async fn each_endpoint_is_fetched_once_per_pass() {
        let transport = device();
        let ctx = connected_context(
            Arc::clone(&transport),
            FirmwareVersion::V2_1_9,
            Arc::new(ManualClock::new(1_000)),
        );
        let controller = PropertyStore::new(Arc::clone(&ctx), ControllerKind);
        let first = PropertyStore::new(Arc::clone(&ctx), StationKind);
        let second = PropertyStore::new(ctx, StationKind);

        let mut cache = ResponseCache::new();
        controller.refresh_all(&mut cache).await.unwrap();
        first.refresh_all(&mut cache).await.unwrap();
        second.refresh_all(&mut cache).await.unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(transport.call_count(ReadEndpoint::ControllerVariables), 1);
        assert_eq!(transport.call_count(ReadEndpoint::StationNamesAndAttributes), 1);
        assert_eq!(
            second.get_value(PropertyKey::StationNames),
            Some(PropertyValue::StringArray(vec!["Lawn".into()]))
        );
        assert_eq!(controller.get_value(PropertyKey::NumberOfBoards), Some(PropertyValue::Number(1)));
    }

    #[tokio::test]
    async fn a_new_pass_fetches_again() {
        let transport = device();
        let ctx = connected_context(
            Arc::clone(&transport),
            FirmwareVersion::V2_1_9,
            Arc::new(ManualClock::new(1_000)),
        );
        let controller = PropertyStore::new(ctx, ControllerKind);

        controller.refresh_all(&mut ResponseCache::new()).await.unwrap();
        controller.refresh_all(&mut ResponseCache::new()).await.unwrap();

        assert_eq!(transport.call_count(ReadEndpoint::ControllerVariables), 2);
    }

    #[tokio::test]
    async fn failed_endpoint_stops_the_owner() {
        let transport = Arc::new(FakeTransport::new().with_response(
            ReadEndpoint::StationNamesAndAttributes,
            json!({ "snames": ["Lawn"], "stn_dis": [0] }),
        ));
        let ctx = connected_context(
            Arc::clone(&transport),
            FirmwareVersion::V2_1_9,
            Arc::new(ManualClock::new(1_000)),
        );
        let station = PropertyStore::new(ctx, StationKind);

        let mut cache = ResponseCache::new();
        let err = station.refresh_all(&mut cache).await.unwrap_err();

        assert!(matches!(err, CoreError::Transport(_)));
        assert!(cache.is_empty());
        assert_eq!(transport.call_count(ReadEndpoint::StationNamesAndAttributes), 0);
    }

    #[tokio::test]
    async fn refresh_one_always_fetches() {
        let transport = device();
        let ctx = connected_context(
            Arc::clone(&transport),
            FirmwareVersion::V2_1_9,
            Arc::new(ManualClock::new(1_000)),
        );
        let station = PropertyStore::new(ctx, StationKind);

        let first = station.refresh_one(PropertyKey::StationDisabled).await.unwrap();
        let second = station.refresh_one(PropertyKey::StationDisabled).await.unwrap();

        assert_eq!(first, PropertyValue::NumberArray(vec![0]));
        assert_eq!(second, first);
        assert_eq!(transport.call_count(ReadEndpoint::StationNamesAndAttributes), 2);
    }

    #[tokio::test]
    async fn refresh_one_reports_missing_values() {
        let transport = Arc::new(
            FakeTransport::new().with_response(ReadEndpoint::ControllerVariables, json!({ "devt": 5 })),
        );
        let ctx = connected_context(
            Arc::clone(&transport),
            FirmwareVersion::V2_1_9,
            Arc::new(ManualClock::new(1_000)),
        );
        let controller = PropertyStore::new(ctx, ControllerKind);

        let err = controller
            .refresh_one(PropertyKey::StationStatusBits)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ValueMissing {
                key: PropertyKey::StationStatusBits
            }
        ));

        let err = controller.refresh_one(PropertyKey::StationNames).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidEndpoint {
                direction: Direction::Read,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn refresh_needs_a_handshake() {
        let transport = device();
        let controller = PropertyStore::new(
            Arc::new(crate::context::DeviceContext::new(transport.clone())),
            ControllerKind,
        );

        let err = controller.refresh_all(&mut ResponseCache::new()).await.unwrap_err();

        assert!(matches!(err, CoreError::NotConnected));
        assert!(transport.calls().is_empty());
    }
}
