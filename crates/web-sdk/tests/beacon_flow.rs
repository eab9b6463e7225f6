//! End-to-end flow: page adapter -> capture -> beacon -> transport.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use beacon_core::{BeaconConfig, BeaconError, BeaconResult};
use beacon_web_sdk::{
    AsyncSend, Beacon, EventCapture, FormSnapshot, InputField, KeyValueStore, MemoryStore,
    OneWaySend, StaticPage, Transport,
};
use serde_json::{json, Value};

/// Records bodies handed to it; fails the first `fail_first` sends.
#[derive(Default)]
struct RecordingSender {
    fail_first: usize,
    attempts: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
}

impl RecordingSender {
    fn failing(fail_first: usize) -> Self {
        Self {
            fail_first,
            ..Default::default()
        }
    }

    fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    fn record(&self, body: &str) -> BeaconResult<()> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) < self.fail_first {
            return Err(BeaconError::Transport("connection reset".into()));
        }
        self.bodies
            .lock()
            .unwrap()
            .push(serde_json::from_str(body).unwrap());
        Ok(())
    }
}

impl AsyncSend for RecordingSender {
    fn send(&self, _url: &str, body: String) -> BeaconResult<()> {
        self.record(&body)
    }
}

impl OneWaySend for RecordingSender {
    fn is_available(&self) -> bool {
        true
    }

    fn send(&self, _url: &str, body: &str) -> BeaconResult<bool> {
        self.record(body).map(|_| true)
    }
}

struct Harness {
    capture: EventCapture<StaticPage>,
    sender: Arc<RecordingSender>,
}

fn harness(store: Arc<dyn KeyValueStore>, sender: RecordingSender) -> Harness {
    let config = BeaconConfig::default();
    let sender = Arc::new(sender);
    let transport = Transport::from_config(&config, None, sender.clone());
    let beacon = Arc::new(Beacon::from_config(&config, store, Arc::new(transport)));
    let page = Rc::new(StaticPage::new("/shop", "Shop"));
    Harness {
        capture: EventCapture::attach(page, beacon),
        sender,
    }
}

#[test]
fn test_full_page_session() {
    let store = Arc::new(MemoryStore::new());
    let h = harness(store.clone(), RecordingSender::default());
    let device_id = store.get("deviceId").unwrap().unwrap();

    h.capture.page().ready();
    h.capture.page().submit(&FormSnapshot::new(vec![
        InputField::new("gift").with_name("search_extra"),
        InputField::new("wifi").with_type("search"),
    ]));
    h.capture.track_search(&json!("  hello  "));

    let bodies = h.sender.bodies();
    assert_eq!(bodies.len(), 3);
    assert_eq!(
        bodies[0],
        json!({"event": "page_view", "deviceId": device_id, "payload": {"path": "/shop", "title": "Shop"}})
    );
    assert_eq!(
        bodies[1],
        json!({"event": "search", "deviceId": device_id, "payload": {"q": "wifi", "page": "/shop"}})
    );
    assert_eq!(bodies[2]["payload"]["q"], "hello");
}

#[test]
fn test_identity_stable_across_page_loads() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let first = harness(store.clone(), RecordingSender::default());
    first.capture.page().ready();
    let second = harness(store, RecordingSender::default());
    second.capture.page().ready();

    assert_eq!(
        first.sender.bodies()[0]["deviceId"],
        second.sender.bodies()[0]["deviceId"]
    );
}

#[test]
fn test_transport_failure_does_not_block_later_events() {
    let h = harness(Arc::new(MemoryStore::new()), RecordingSender::failing(1));

    h.capture.page().ready();
    h.capture
        .page()
        .submit(&FormSnapshot::new(vec![InputField::new("laptop").with_id("search")]));

    let bodies = h.sender.bodies();
    assert_eq!(h.sender.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["event"], "search");
    assert_eq!(h.capture.page().completed_submissions(), 1);
}

#[test]
fn test_one_way_sender_carries_events_when_available() {
    let config = BeaconConfig::default();
    let one_way = Arc::new(RecordingSender::default());
    let fallback = Arc::new(RecordingSender::default());
    let transport = Transport::from_config(
        &config,
        Some(one_way.clone() as Arc<dyn OneWaySend>),
        fallback.clone(),
    );
    let beacon = Arc::new(Beacon::from_config(
        &config,
        Arc::new(MemoryStore::new()),
        Arc::new(transport),
    ));
    let capture = EventCapture::attach(Rc::new(StaticPage::new("/", "Home")), beacon);

    capture.page().ready();

    assert_eq!(one_way.bodies().len(), 1);
    assert!(fallback.bodies().is_empty());
}
