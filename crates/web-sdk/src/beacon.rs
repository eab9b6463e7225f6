//! The beacon facade: tags events with the device identity and hands them
//! to the configured delivery.

use std::sync::Arc;

use beacon_core::types::{coerce_query, search_payload};
use beacon_core::{BeaconConfig, Delivery, DeliveryPayload, DeviceId, Event, EventName, Payload};
use serde_json::Value;
use tracing::debug;

use crate::identity::{IdentityManager, KeyValueStore};

pub struct Beacon {
    identity: IdentityManager,
    delivery: Arc<dyn Delivery>,
}

impl Beacon {
    /// Create a beacon. The device identity is resolved immediately, so the
    /// first write to storage happens at load time rather than on the first
    /// event.
    pub fn new(identity: IdentityManager, delivery: Arc<dyn Delivery>) -> Self {
        let device_id = identity.device_id();
        debug!(%device_id, "beacon identity resolved");
        Self { identity, delivery }
    }

    pub fn from_config(
        config: &BeaconConfig,
        store: Arc<dyn KeyValueStore>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self::new(
            IdentityManager::new(store, config.storage_key.clone()),
            delivery,
        )
    }

    pub fn device_id(&self) -> DeviceId {
        self.identity.device_id()
    }

    /// Fire-and-forget: build the event and hand it to delivery.
    pub fn send(&self, name: EventName, payload: Option<Payload>) {
        let event = Event::new(name, self.identity.device_id(), payload);
        self.delivery.deliver(&DeliveryPayload::from(event));
    }

    /// Manual search report. `value` is coerced to a trimmed string and the
    /// event is sent even when the result is empty.
    pub fn track_search(&self, value: &Value, page: &str) {
        let query = coerce_query(value);
        self.send(EventName::Search, Some(search_payload(query, page)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryStore;
    use beacon_core::capture_delivery;
    use serde_json::json;

    fn beacon() -> (Beacon, Arc<beacon_core::CaptureDelivery>) {
        let delivery = capture_delivery();
        let beacon = Beacon::from_config(
            &BeaconConfig::default(),
            Arc::new(MemoryStore::new()),
            delivery.clone(),
        );
        (beacon, delivery)
    }

    #[test]
    fn test_identity_persisted_at_construction() {
        let store = Arc::new(MemoryStore::new());
        let beacon = Beacon::from_config(
            &BeaconConfig::default(),
            store.clone(),
            beacon_core::noop_delivery(),
        );
        assert_eq!(
            store.get("deviceId").unwrap(),
            Some(beacon.device_id().to_string())
        );
    }

    #[test]
    fn test_send_tags_device_and_defaults_payload() {
        let (beacon, delivery) = beacon();
        beacon.send(EventName::PageView, None);

        let sent = delivery.payloads();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, EventName::PageView);
        assert_eq!(sent[0].device_id, beacon.device_id());
        assert!(sent[0].payload.is_empty());
    }

    #[test]
    fn test_track_search_trims() {
        let (beacon, delivery) = beacon();
        beacon.track_search(&json!("  hello  "), "/results");

        let sent = delivery.payloads();
        assert_eq!(sent[0].event, EventName::Search);
        assert_eq!(sent[0].payload.get("q"), Some(&json!("hello")));
        assert_eq!(sent[0].payload.get("page"), Some(&json!("/results")));
    }

    #[test]
    fn test_track_search_sends_empty_queries() {
        let (beacon, delivery) = beacon();
        beacon.track_search(&json!("   "), "/");
        beacon.track_search(&Value::Null, "/");

        assert_eq!(delivery.count_event(EventName::Search), 2);
        for payload in delivery.payloads() {
            assert_eq!(payload.payload.get("q"), Some(&json!("")));
        }
    }
}
