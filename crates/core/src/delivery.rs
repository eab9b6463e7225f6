//! Delivery seam: the uniform "hand off and forget" contract every transport
//! implements.
//!
//! Capture code accepts an `Arc<dyn Delivery>` and never learns whether an
//! event reached the collection endpoint.

use std::sync::{Arc, Mutex};

use crate::types::{DeliveryPayload, EventName};

/// Ships a payload on a best-effort basis. Implementations must not panic
/// and must swallow every failure.
pub trait Delivery: Send + Sync {
    fn deliver(&self, payload: &DeliveryPayload);
}

/// Discards every payload.
pub struct NoOpDelivery;

impl Delivery for NoOpDelivery {
    fn deliver(&self, _payload: &DeliveryPayload) {}
}

/// Records payloads in memory, for tests and dry runs.
#[derive(Default)]
pub struct CaptureDelivery {
    payloads: Mutex<Vec<DeliveryPayload>>,
}

impl CaptureDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<DeliveryPayload> {
        self.payloads.lock().expect("delivery mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.payloads.lock().expect("delivery mutex poisoned").len()
    }

    pub fn count_event(&self, event: EventName) -> usize {
        self.payloads
            .lock()
            .expect("delivery mutex poisoned")
            .iter()
            .filter(|p| p.event == event)
            .count()
    }

    pub fn clear(&self) {
        self.payloads.lock().expect("delivery mutex poisoned").clear();
    }
}

impl Delivery for CaptureDelivery {
    fn deliver(&self, payload: &DeliveryPayload) {
        self.payloads
            .lock()
            .expect("delivery mutex poisoned")
            .push(payload.clone());
    }
}

/// Convenience: a delivery that drops everything.
pub fn noop_delivery() -> Arc<dyn Delivery> {
    Arc::new(NoOpDelivery)
}

/// Convenience: a capturing delivery for tests.
pub fn capture_delivery() -> Arc<CaptureDelivery> {
    Arc::new(CaptureDelivery::new())
}
