/// SHOWROOM raw wire types — serde shapes for the event search endpoint.
/// Ranking payloads have no stable shape and are handled as raw JSON in ranking.rs.
use crate::EventDescriptor;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

/// Key the search endpoint stores its events under.
pub const EVENT_LIST_KEY: &str = "event_list";

#[derive(Debug, Deserialize, Clone)]
pub struct WireEvent {
    pub event_id: i64,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_url_key: Option<String>,
    #[serde(default)]
    pub started_at: Option<i64>,
    #[serde(default)]
    pub ended_at: Option<i64>,
    #[serde(default)]
    pub type_name: Option<String>,
}

impl From<WireEvent> for EventDescriptor {
    fn from(w: WireEvent) -> Self {
        EventDescriptor {
            event_id: w.event_id,
            event_name: w.event_name.unwrap_or_default(),
            event_key: w.event_url_key.filter(|k| !k.trim().is_empty()),
            started_at: w.started_at,
            ended_at: w.ended_at,
            type_name: w.type_name,
        }
    }
}

/// Events on one search page. A page without `event_list` contributes nothing;
/// entries that don't carry a numeric `event_id` are skipped.
pub fn events_from_page(page: &Value) -> Vec<EventDescriptor> {
    let Some(entries) = page.get(EVENT_LIST_KEY).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match WireEvent::deserialize(entry) {
            Ok(wire) => Some(EventDescriptor::from(wire)),
            Err(e) => {
                debug!("skipping event entry: {e}");
                None
            }
        })
        .collect()
}
