//! Delivery transport: serializes an event and ships it to the collection
//! endpoint with whichever mechanism the runtime offers.
//!
//! Two strategies sit behind the [`Delivery`] contract:
//!
//! - a one-way sender ([`OneWaySend`]) that survives page teardown, used
//!   whenever it is available;
//! - an asynchronous HTTP `POST` ([`AsyncSend`]) used otherwise.
//!
//! Every failure is logged at `debug` and dropped. There is no retry.

use std::sync::Arc;

use beacon_core::{BeaconConfig, BeaconResult, Delivery, DeliveryPayload};
use tracing::debug;

/// Non-blocking, page-unload-safe send primitive.
pub trait OneWaySend: Send + Sync {
    /// Whether the runtime offers the primitive at all.
    fn is_available(&self) -> bool;

    /// Hand `body` to the primitive. `Ok(false)` means it refused to queue it.
    fn send(&self, url: &str, body: &str) -> BeaconResult<bool>;
}

/// Asynchronous JSON `POST`. Starts the request and returns immediately;
/// completion is never awaited by the caller.
pub trait AsyncSend: Send + Sync {
    fn send(&self, url: &str, body: String) -> BeaconResult<()>;
}

/// Which strategy carried a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    OneWay,
    Fallback,
}

/// Two-strategy dispatcher bound to one collection endpoint.
pub struct Transport {
    endpoint: String,
    one_way: Option<Arc<dyn OneWaySend>>,
    fallback: Arc<dyn AsyncSend>,
}

impl Transport {
    pub fn new(endpoint: impl Into<String>, fallback: Arc<dyn AsyncSend>) -> Self {
        Self {
            endpoint: endpoint.into(),
            one_way: None,
            fallback,
        }
    }

    /// Build from configuration. The one-way sender is dropped when the
    /// configuration opts out of it.
    pub fn from_config(
        config: &BeaconConfig,
        one_way: Option<Arc<dyn OneWaySend>>,
        fallback: Arc<dyn AsyncSend>,
    ) -> Self {
        let transport = Self::new(config.endpoint.clone(), fallback);
        match one_way {
            Some(one_way) if config.prefer_one_way => transport.with_one_way(one_way),
            _ => transport,
        }
    }

    pub fn with_one_way(mut self, one_way: Arc<dyn OneWaySend>) -> Self {
        self.one_way = Some(one_way);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Serialize and hand off `payload`, reporting the strategy used.
    pub fn dispatch(&self, payload: &DeliveryPayload) -> BeaconResult<Route> {
        let body = payload.to_json()?;

        if let Some(one_way) = self.one_way.as_ref().filter(|s| s.is_available()) {
            let queued = one_way.send(&self.endpoint, &body)?;
            if !queued {
                debug!(event = %payload.event, "one-way sender refused payload, event lost");
            }
            return Ok(Route::OneWay);
        }

        self.fallback.send(&self.endpoint, body)?;
        Ok(Route::Fallback)
    }
}

impl Delivery for Transport {
    fn deliver(&self, payload: &DeliveryPayload) {
        match self.dispatch(payload) {
            Ok(route) => debug!(event = %payload.event, ?route, "event handed off"),
            Err(e) => debug!(event = %payload.event, error = %e, "event delivery failed"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native::HttpFallback;

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use beacon_core::{BeaconError, BeaconResult};
    use parking_lot::Mutex;
    use reqwest::header::CONTENT_TYPE;
    use tokio::task::JoinHandle;
    use tracing::debug;

    use super::AsyncSend;

    /// `reqwest`-backed fallback that spawns each `POST` onto the ambient
    /// tokio runtime.
    pub struct HttpFallback {
        client: reqwest::Client,
        in_flight: Mutex<Vec<JoinHandle<()>>>,
    }

    impl HttpFallback {
        pub fn new() -> BeaconResult<Self> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|e| BeaconError::Transport(format!("http client: {e}")))?;
            Ok(Self::with_client(client))
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self {
                client,
                in_flight: Mutex::new(Vec::new()),
            }
        }

        /// Number of sends that have not completed yet.
        pub fn in_flight(&self) -> usize {
            let mut in_flight = self.in_flight.lock();
            in_flight.retain(|task| !task.is_finished());
            in_flight.len()
        }

        /// Wait for every started send to finish. For short-lived processes
        /// that would otherwise exit before the request leaves.
        pub async fn flush(&self) {
            let tasks = std::mem::take(&mut *self.in_flight.lock());
            for task in tasks {
                let _ = task.await;
            }
        }
    }

    impl AsyncSend for HttpFallback {
        fn send(&self, url: &str, body: String) -> BeaconResult<()> {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| BeaconError::Transport(format!("no async runtime: {e}")))?;

            let request = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body);

            let task = runtime.spawn(async move {
                match request.send().await {
                    Ok(response) => debug!(status = %response.status(), "collection endpoint answered"),
                    Err(e) => debug!(error = %e, "collection request failed"),
                }
            });

            let mut in_flight = self.in_flight.lock();
            in_flight.retain(|task| !task.is_finished());
            in_flight.push(task);
            Ok(())
        }
    }
}
