//! Client-side search beacon: anonymous device identity, page-view and
//! search capture, and best-effort delivery to a collection endpoint.
//!
//! # Modules
//!
//! - [`identity`]: Device identity, created once and persisted in a [`KeyValueStore`]
//! - [`page`]: Host page adapter trait and the search-field heuristic
//! - [`capture`]: Automatic page-view/search triggers and the manual trigger
//! - [`transport`]: One-way send with asynchronous HTTP fallback
//! - [`beacon`]: Facade that tags events and hands them to delivery

pub mod beacon;
pub mod capture;
pub mod identity;
pub mod page;
pub mod transport;

pub use beacon::Beacon;
pub use capture::EventCapture;
pub use identity::{FileStore, IdentityManager, KeyValueStore, MemoryStore};
pub use page::{select_search_field, FormSnapshot, HostPage, InputField, StaticPage};
#[cfg(not(target_arch = "wasm32"))]
pub use transport::HttpFallback;
pub use transport::{AsyncSend, OneWaySend, Route, Transport};
