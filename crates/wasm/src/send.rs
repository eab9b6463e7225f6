//! Browser transports: `navigator.sendBeacon` and a `fetch` fallback.

use beacon_core::{BeaconError, BeaconResult};
use beacon_web_sdk::{AsyncSend, OneWaySend};
use js_sys::{Array, Reflect};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Headers, RequestInit};

use crate::js_error;

const JSON_CONTENT_TYPE: &str = "application/json";

/// `navigator.sendBeacon`, which the browser completes even while the page
/// unloads.
pub struct SendBeacon;

impl OneWaySend for SendBeacon {
    fn is_available(&self) -> bool {
        web_sys::window()
            .map(|window| {
                Reflect::has(&window.navigator(), &JsValue::from_str("sendBeacon")).unwrap_or(false)
            })
            .unwrap_or(false)
    }

    fn send(&self, url: &str, body: &str) -> BeaconResult<bool> {
        let window = web_sys::window().ok_or_else(|| BeaconError::Transport("no window".into()))?;
        let options = BlobPropertyBag::new();
        options.set_type(JSON_CONTENT_TYPE);
        let parts = Array::of1(&JsValue::from_str(body));
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options)
            .map_err(|e| BeaconError::Transport(js_error(&e)))?;
        window
            .navigator()
            .send_beacon_with_opt_blob(url, Some(&blob))
            .map_err(|e| BeaconError::Transport(js_error(&e)))
    }
}

thread_local! {
    static IGNORE_REJECTION: Closure<dyn FnMut(JsValue)> = Closure::new(|_reason: JsValue| {});
}

/// `fetch` POST with a JSON content type. The returned promise is never
/// awaited; a rejection is caught and dropped.
pub struct FetchFallback;

impl AsyncSend for FetchFallback {
    fn send(&self, url: &str, body: String) -> BeaconResult<()> {
        let window = web_sys::window().ok_or_else(|| BeaconError::Transport("no window".into()))?;

        let headers = Headers::new().map_err(|e| BeaconError::Transport(js_error(&e)))?;
        headers
            .set("Content-Type", JSON_CONTENT_TYPE)
            .map_err(|e| BeaconError::Transport(js_error(&e)))?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let pending = window.fetch_with_str_and_init(url, &init);
        IGNORE_REJECTION.with(|ignore| {
            let _ = pending.catch(ignore);
        });
        Ok(())
    }
}
