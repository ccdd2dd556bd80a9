#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::model::agenda::{unify, AgendaItem};
    use crate::model::{Event, EventSource, PublishStatus};

    fn legacy(slug: &str, day: u32, status: &str) -> AgendaItem {
        serde_json::from_value(json!({
            "id": format!("ag-{}", slug),
            "slug": slug,
            "title": format!("Legacy {}", slug),
            "summary": "old summary",
            "start_at": format!("2030-05-{:02}T20:00:00Z", day),
            "city": "Recife",
            "location_name": "Paço do Frevo",
            "tags": ["frevo"],
            "status": status,
        }))
        .unwrap()
    }

    fn event(slug: &str, day: u32, status: PublishStatus) -> Event {
        Event {
            id: format!("ev-{}", slug),
            slug: slug.to_string(),
            title: format!("Event {}", slug),
            description: None,
            starts_at: Utc.with_ymd_and_hms(2030, 5, day, 21, 0, 0).unwrap(),
            ends_at: None,
            city: "Recife".to_string(),
            venue_id: None,
            venue_name: None,
            organizer_id: None,
            artist_ids: vec![],
            categories: vec![],
            cover_url: None,
            ticket_url: None,
            price_min: None,
            is_free: true,
            status,
            source: EventSource::Events,
            created_at: None,
        }
    }

    #[test]
    fn test_adapter_maps_legacy_fields() {
        let e: Event = legacy("frevo-night", 3, "publicado").into();
        assert_eq!(e.source, EventSource::Legacy);
        assert_eq!(e.description.as_deref(), Some("old summary"));
        assert_eq!(e.venue_name.as_deref(), Some("Paço do Frevo"));
        assert_eq!(e.categories, vec!["frevo".to_string()]);
        assert_eq!(e.status, PublishStatus::Published);
        assert_eq!(e.starts_at, Utc.with_ymd_and_hms(2030, 5, 3, 20, 0, 0).unwrap());
    }

    #[test]
    fn test_unify_prefers_events_and_drops_unpublished() {
        let events = vec![
            event("shared", 10, PublishStatus::Published),
            event("draft-only", 1, PublishStatus::Draft),
        ];
        let items = vec![
            legacy("shared", 2, "published"),
            legacy("legacy-only", 5, "published"),
            legacy("legacy-draft", 4, "draft"),
        ];

        let merged = unify(events, items);
        let slugs: Vec<&str> = merged.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs, vec!["legacy-only", "shared"]);
        assert_eq!(merged[1].source, EventSource::Events);
    }
}
