//! Host page adapter over the live DOM.

use beacon_core::{BeaconError, BeaconResult};
use beacon_web_sdk::page::{ReadyHandler, SubmitHandler};
use beacon_web_sdk::{select_search_field, HostPage, InputField};
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::{Document, DocumentReadyState, Event, HtmlFormElement, HtmlInputElement, Window};

use crate::js_error;

pub struct DomPage {
    window: Window,
    document: Document,
}

impl DomPage {
    pub fn current() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }
}

impl HostPage for DomPage {
    type Form = HtmlFormElement;

    fn on_ready(&self, handler: ReadyHandler) {
        // The module usually initializes after DOMContentLoaded has fired.
        if is_past_loading(self.document.ready_state()) {
            handler();
            return;
        }
        let callback = Closure::once_into_js(move || handler());
        if let Err(e) = self
            .document
            .add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
        {
            debug!(error = %js_error(&e), "ready listener not installed");
        }
    }

    fn on_submit(&self, handler: SubmitHandler<HtmlFormElement>) {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let form = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlFormElement>().ok());
            if let Some(form) = form {
                handler(&form);
            }
        });
        // Capture phase, so submissions stopped by page handlers are still seen.
        if let Err(e) = self.document.add_event_listener_with_callback_and_bool(
            "submit",
            callback.as_ref().unchecked_ref(),
            true,
        ) {
            debug!(error = %js_error(&e), "submit listener not installed");
        }
        callback.forget();
    }

    fn find_search_field(&self, form: &HtmlFormElement) -> BeaconResult<Option<InputField>> {
        let nodes = form
            .query_selector_all("input")
            .map_err(|e| BeaconError::Dom(js_error(&e)))?;

        let inputs: Vec<InputField> = (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<HtmlInputElement>().ok())
            .map(|input| {
                input_field(
                    input.get_attribute("type"),
                    input.get_attribute("name"),
                    input.get_attribute("id"),
                    input.value(),
                )
            })
            .collect();

        Ok(select_search_field(&inputs).cloned())
    }

    fn path(&self) -> String {
        self.window.location().pathname().unwrap_or_default()
    }

    fn title(&self) -> String {
        self.document.title()
    }
}

fn is_past_loading(state: DocumentReadyState) -> bool {
    !matches!(state, DocumentReadyState::Loading)
}

/// Mirror of an `<input>` element's attributes. Absent attributes stay `None`.
fn input_field(
    kind: Option<String>,
    name: Option<String>,
    id: Option<String>,
    value: String,
) -> InputField {
    InputField {
        kind,
        name,
        id,
        value,
    }
}
