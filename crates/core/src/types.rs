//! Event data model and the wire-level delivery payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event-specific properties: string keys to primitive JSON values.
pub type Payload = Map<String, Value>;

/// Anonymous per-device identifier, a lowercase hyphenated UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed set of events the beacon reports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PageView,
    Search,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::PageView => "page_view",
            EventName::Search => "search",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named occurrence tagged with the device identity. Built and sent in the
/// same turn; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: EventName,
    pub device_id: DeviceId,
    pub payload: Payload,
}

impl Event {
    pub fn new(name: EventName, device_id: DeviceId, payload: Option<Payload>) -> Self {
        Self {
            name,
            device_id,
            payload: payload.unwrap_or_default(),
        }
    }
}

/// JSON body posted to the collection endpoint:
/// `{"event": ..., "deviceId": ..., "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub event: EventName,
    #[serde(rename = "deviceId")]
    pub device_id: DeviceId,
    pub payload: Payload,
}

impl DeliveryPayload {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<Event> for DeliveryPayload {
    fn from(event: Event) -> Self {
        Self {
            event: event.name,
            device_id: event.device_id,
            payload: event.payload,
        }
    }
}

/// Payload of a `page_view` event.
pub fn page_view_payload(path: impl Into<String>, title: impl Into<String>) -> Payload {
    let mut payload = Payload::new();
    payload.insert("path".into(), Value::String(path.into()));
    payload.insert("title".into(), Value::String(title.into()));
    payload
}

/// Payload of a `search` event.
pub fn search_payload(query: impl Into<String>, page: impl Into<String>) -> Payload {
    let mut payload = Payload::new();
    payload.insert("q".into(), Value::String(query.into()));
    payload.insert("page".into(), Value::String(page.into()));
    payload
}

/// Coerce an arbitrary value into a search query the way a page script
/// would stringify it, treating falsy values (`null`, `false`, `0`, `""`) as
/// the empty string. The result is trimmed.
pub fn coerce_query(value: &Value) -> String {
    let falsy = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    if falsy {
        return String::new();
    }
    trim_query(&stringify(value)).to_string()
}

/// Trim the way page scripts do: Unicode whitespace plus the byte-order mark.
pub fn trim_query(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => {
                format!("{f:.0}")
            }
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delivery_payload_wire_shape() {
        let event = Event::new(
            EventName::Search,
            DeviceId::new("0f8fad5b-d9cb-469f-a165-70867728950e"),
            Some(search_payload("wifi", "/products")),
        );
        let body = DeliveryPayload::from(event).to_json().unwrap();
        let parsed: Value = serde_json::from_str(&body).unwrap();

        assert_eq!(
            parsed,
            json!({
                "event": "search",
                "deviceId": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "payload": { "q": "wifi", "page": "/products" }
            })
        );
        assert!(body.starts_with(r#"{"event":"search","deviceId":"#));
    }

    #[test]
    fn test_missing_payload_defaults_to_empty_object() {
        let event = Event::new(EventName::PageView, DeviceId::new("d"), None);
        let body = DeliveryPayload::from(event).to_json().unwrap();
        assert_eq!(body, r#"{"event":"page_view","deviceId":"d","payload":{}}"#);
    }

    #[test]
    fn test_page_view_payload_keys() {
        let payload = page_view_payload("/about", "About us");
        assert_eq!(payload.get("path"), Some(&json!("/about")));
        assert_eq!(payload.get("title"), Some(&json!("About us")));
        assert_eq!(payload.len(), 2);
    }

    #[test]
    fn test_coerce_query_strings_are_trimmed() {
        assert_eq!(coerce_query(&json!("  hello  ")), "hello");
        assert_eq!(coerce_query(&json!("   ")), "");
    }

    #[test]
    fn test_trim_query_strips_byte_order_mark() {
        assert_eq!(trim_query("\u{FEFF}wifi\u{FEFF}"), "wifi");
        assert_eq!(trim_query("\u{FEFF} \u{00A0}"), "");
        assert_eq!(coerce_query(&json!("\u{FEFF}")), "");
    }

    #[test]
    fn test_coerce_query_falsy_values_become_empty() {
        for value in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert_eq!(coerce_query(&value), "", "{value} should coerce to empty");
        }
    }

    #[test]
    fn test_coerce_query_non_string_values() {
        assert_eq!(coerce_query(&json!(42)), "42");
        assert_eq!(coerce_query(&json!(2.5)), "2.5");
        assert_eq!(coerce_query(&json!(3.0)), "3");
        assert_eq!(coerce_query(&json!(-7.0)), "-7");
        assert_eq!(coerce_query(&json!(1e20)), "100000000000000000000");
        assert_eq!(coerce_query(&json!(1.5e300)), "1.5e+300");
        assert_eq!(coerce_query(&json!(true)), "true");
        assert_eq!(coerce_query(&json!(["a", 1, null])), "a,1,");
        assert_eq!(coerce_query(&json!({"k": "v"})), "[object Object]");
    }
}
