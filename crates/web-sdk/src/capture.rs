//! Event capture: turns host page signals into beacon events.
//!
//! Two automatic triggers are installed on attach: one `page_view` when the
//! document is ready, and a `search` for every submitted form that carries a
//! non-empty search-like input. The manual trigger is
//! [`EventCapture::track_search`].

use std::rc::Rc;
use std::sync::Arc;

use beacon_core::types::{page_view_payload, search_payload, trim_query};
use beacon_core::EventName;
use serde_json::Value;
use tracing::{debug, info};

use crate::beacon::Beacon;
use crate::page::HostPage;

pub struct EventCapture<P: HostPage> {
    page: Rc<P>,
    beacon: Arc<Beacon>,
}

impl<P: HostPage> EventCapture<P> {
    /// Install both automatic triggers on `page`.
    pub fn attach(page: Rc<P>, beacon: Arc<Beacon>) -> Self {
        {
            let weak = Rc::downgrade(&page);
            let beacon = beacon.clone();
            page.on_ready(Box::new(move || {
                if let Some(page) = weak.upgrade() {
                    record_page_view(&*page, &beacon);
                }
            }));
        }

        {
            let weak = Rc::downgrade(&page);
            let beacon = beacon.clone();
            page.on_submit(Box::new(move |form: &P::Form| {
                if let Some(page) = weak.upgrade() {
                    record_search_submission(&*page, form, &beacon);
                }
            }));
        }

        info!(path = %page.path(), "beacon attached to page");
        Self { page, beacon }
    }

    /// Manually report a search for the current page.
    pub fn track_search(&self, value: &Value) {
        self.beacon.track_search(value, &self.page.path());
    }

    pub fn page(&self) -> &Rc<P> {
        &self.page
    }

    pub fn beacon(&self) -> &Arc<Beacon> {
        &self.beacon
    }
}

fn record_page_view<P: HostPage>(page: &P, beacon: &Beacon) {
    beacon.send(
        EventName::PageView,
        Some(page_view_payload(page.path(), page.title())),
    );
}

fn record_search_submission<P: HostPage>(page: &P, form: &P::Form, beacon: &Beacon) {
    let field = match page.find_search_field(form) {
        Ok(Some(field)) => field,
        Ok(None) => return,
        Err(e) => {
            debug!(error = %e, "form inspection failed, submission ignored");
            return;
        }
    };

    let query = trim_query(&field.value);
    if query.is_empty() {
        return;
    }
    beacon.send(EventName::Search, Some(search_payload(query, page.path())));
}
