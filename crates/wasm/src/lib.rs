#![warn(clippy::unwrap_used)]

//! Browser embedding of the search beacon.
//!
//! Loading the module installs the beacon on the current page:
//!
//! - the device identity is read from (or written to) `localStorage`;
//! - one `page_view` is reported once the document is ready;
//! - every form submission carrying a search-like input is reported;
//! - `window.trackSearch(value)` reports a search manually.
//!
//! Events go out through `navigator.sendBeacon` when the browser has it,
//! and through `fetch` otherwise.
//!
//! ```html
//! <script type="module">
//!   import init from "./beacon_wasm.js";
//!   await init();
//!   // later, from any page script:
//!   window.trackSearch("wifi router");
//! </script>
//! ```
//!
//! The collection endpoint is fixed at build time through the
//! `SEARCH_BEACON_ENDPOINT` environment variable.

pub mod dom;
pub mod send;
pub mod storage;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use beacon_core::BeaconConfig;
use beacon_web_sdk::{Beacon, EventCapture, OneWaySend, Transport};
use serde_json::Value;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::dom::DomPage;
use crate::send::{FetchFallback, SendBeacon};
use crate::storage::LocalStorage;

thread_local! {
    static CAPTURE: RefCell<Option<EventCapture<DomPage>>> = const { RefCell::new(None) };
}

#[wasm_bindgen]
extern "C" {
    /// The page's global `String` conversion.
    #[wasm_bindgen(js_name = String)]
    fn js_string(value: &JsValue) -> String;
}

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    install();
}

/// Configuration baked into the bundle.
pub fn beacon_config() -> BeaconConfig {
    match option_env!("SEARCH_BEACON_ENDPOINT") {
        Some(endpoint) => BeaconConfig::default().with_endpoint(endpoint),
        None => BeaconConfig::default(),
    }
}

fn install() {
    if CAPTURE.with(|capture| capture.borrow().is_some()) {
        return;
    }
    let Some(page) = DomPage::current() else {
        debug!("no document, beacon not installed");
        return;
    };

    let config = beacon_config();
    let transport = Transport::from_config(
        &config,
        Some(Arc::new(SendBeacon) as Arc<dyn OneWaySend>),
        Arc::new(FetchFallback),
    );
    let beacon = Beacon::from_config(&config, Arc::new(LocalStorage), Arc::new(transport));
    let capture = EventCapture::attach(Rc::new(page), Arc::new(beacon));
    CAPTURE.with(|slot| *slot.borrow_mut() = Some(capture));

    expose_track_search();
}

/// Publish `trackSearch` on the global object.
fn expose_track_search() {
    let Some(window) = web_sys::window() else {
        return;
    };
    let callback = Closure::<dyn Fn(JsValue)>::new(track_search);
    if let Err(e) = js_sys::Reflect::set(
        &window,
        &JsValue::from_str("trackSearch"),
        callback.as_ref(),
    ) {
        debug!(error = %js_error(&e), "trackSearch not exposed");
    }
    callback.forget();
}

/// Report a search manually. Any value is accepted and stringified the way
/// page scripts would; empty queries are still reported.
#[wasm_bindgen(js_name = trackSearch)]
pub fn track_search(value: JsValue) {
    let query = manual_query(value.is_falsy(), || js_string(&value));
    CAPTURE.with(|capture| {
        if let Some(capture) = capture.borrow().as_ref() {
            capture.track_search(&Value::String(query));
        }
    });
}

/// The device identity in use on this page, if the beacon is installed.
#[wasm_bindgen(js_name = deviceId)]
pub fn device_id() -> Option<String> {
    CAPTURE.with(|capture| {
        capture
            .borrow()
            .as_ref()
            .map(|capture| capture.beacon().device_id().to_string())
    })
}

/// Text of a manually reported query: empty for falsy values, otherwise the
/// page's own string conversion.
fn manual_query(falsy: bool, render: impl FnOnce() -> String) -> String {
    if falsy {
        String::new()
    } else {
        render()
    }
}

pub(crate) fn js_error(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}
