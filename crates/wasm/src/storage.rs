//! `window.localStorage` as the durable identity store.

use beacon_core::{BeaconError, BeaconResult};
use beacon_web_sdk::KeyValueStore;
use web_sys::Storage;

use crate::js_error;

/// Origin-scoped persistent storage. Looked up on every access, so a page
/// that blocks storage (private mode, sandboxed iframe) yields errors rather
/// than panics.
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> BeaconResult<Storage> {
        let window = web_sys::window().ok_or_else(|| BeaconError::Storage("no window".into()))?;
        window
            .local_storage()
            .map_err(|e| BeaconError::Storage(js_error(&e)))?
            .ok_or_else(|| BeaconError::Storage("localStorage unavailable".into()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> BeaconResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| BeaconError::Storage(js_error(&e)))
    }

    fn set(&self, key: &str, value: &str) -> BeaconResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| BeaconError::Storage(js_error(&e)))
    }
}
