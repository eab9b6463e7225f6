//! Core building blocks shared by every beacon embedding: the event data
//! model, the wire payload, configuration, errors and the [`Delivery`] seam.

pub mod config;
pub mod delivery;
pub mod error;
pub mod types;

pub use crate::config::BeaconConfig;
pub use crate::delivery::{
    capture_delivery, noop_delivery, CaptureDelivery, Delivery, NoOpDelivery,
};
pub use crate::error::{BeaconError, BeaconResult};
pub use crate::types::{DeliveryPayload, DeviceId, Event, EventName, Payload};
