//! View construction from stored node properties.
//!
//! Both store implementations build the same inference views from the
//! same property shapes, so the field mapping lives here.

use korpus_core::{parse_stored_date, EventView, JsonMap, MicroActionView};

fn prop_str(properties: &JsonMap, key: &str) -> Option<String> {
    properties.get(key)?.as_str().map(str::to_string)
}

/// Build a micro-action view from its node properties. Edge-derived
/// fields (`concerned_persons`, `has_reply_edge`) start empty.
pub fn micro_action_view(id: &str, properties: &JsonMap) -> MicroActionView {
    MicroActionView {
        id: id.to_string(),
        actor_id: prop_str(properties, "actor_id"),
        recipient_id: prop_str(properties, "recipient_id"),
        link_type: prop_str(properties, "link_type"),
        date_start: parse_stored_date(properties.get("date_start").and_then(|v| v.as_str())),
        date_end: parse_stored_date(properties.get("date_end").and_then(|v| v.as_str())),
        ..Default::default()
    }
}

/// Build an event view from its node properties.
pub fn event_view(id: &str, properties: &JsonMap) -> EventView {
    EventView {
        id: id.to_string(),
        victim_id: prop_str(properties, "victim_id"),
        date_start: parse_stored_date(properties.get("date_start").and_then(|v| v.as_str())),
        date_end: parse_stored_date(properties.get("date_end").and_then(|v| v.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_micro_action_view_fields() {
        let mut props = JsonMap::new();
        props.insert("actor_id".to_string(), "/id/person/a".into());
        props.insert("recipient_id".to_string(), "/id/org/b".into());
        props.insert("link_type".to_string(), "replies_to".into());
        props.insert("date_start".to_string(), "1942-03-29".into());

        let view = micro_action_view("/id/microaction/m", &props);
        assert_eq!(view.actor_id.as_deref(), Some("/id/person/a"));
        assert_eq!(view.date_start, NaiveDate::from_ymd_opt(1942, 3, 29));
        assert_eq!(view.date_end, None);
        assert!(view.concerned_persons.is_empty());
        assert!(!view.has_reply_edge);
    }

    #[test]
    fn test_event_view_tolerates_invalid_dates() {
        let mut props = JsonMap::new();
        props.insert("victim_id".to_string(), "/id/person/v".into());
        // Permissive storage may hold calendar-impossible dates; views
        // treat them as absent.
        props.insert("date_start".to_string(), "1943-02-30".into());

        let view = event_view("/id/event/e", &props);
        assert_eq!(view.victim_id.as_deref(), Some("/id/person/v"));
        assert_eq!(view.date_start, None);
    }
}
