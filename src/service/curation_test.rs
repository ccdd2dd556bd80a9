#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::MemoryBackend;
    use crate::cache::TtlCache;
    use crate::model::{AgentKind, PublishStatus};
    use crate::schema::{AgentDraft, EventDraft, HighlightDraft, RevistaPostDraft};
    use crate::service::{Catalog, Curation, EventFilter, ReadCache, ServiceError};

    fn setup() -> (Arc<MemoryBackend>, Curation, Catalog) {
        let backend = Arc::new(MemoryBackend::new());
        let cache = ReadCache::new(Arc::new(TtlCache::new("test", Duration::from_secs(60), 128)));
        (
            backend.clone(),
            Curation::new(backend.clone(), cache.clone()),
            Catalog::new(backend, cache),
        )
    }

    fn event_draft(title: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            starts_at: Some(Utc.with_ymd_and_hms(2099, 4, 1, 21, 0, 0).unwrap()),
            city: "Salvador".to_string(),
            status: PublishStatus::Published,
            ..Default::default()
        }
    }

    fn highlight_draft(event_id: &str, position: i32) -> HighlightDraft {
        serde_json::from_value(json!({
            "event_id": event_id,
            "placement": "home",
            "position": position
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_event_slugs_are_derived_and_unique() {
        let (_backend, curation, _catalog) = setup();
        let first = curation.create_event(event_draft("Ensaio do Olodum")).await.unwrap();
        let second = curation.create_event(event_draft("Ensaio do Olodum")).await.unwrap();
        assert_eq!(first.slug, "ensaio-do-olodum");
        assert_eq!(second.slug, "ensaio-do-olodum-2");

        let mut explicit = event_draft("Outro");
        explicit.slug = Some("ensaio-do-olodum".to_string());
        let err = curation.create_event(explicit).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.get("slug").is_some()));

        // Keeping its own slug on update is fine.
        let mut same = event_draft("Ensaio do Olodum (extra)");
        same.slug = Some("ensaio-do-olodum".to_string());
        let updated = curation.update_event(&first.id, same).await.unwrap();
        assert_eq!(updated.slug, "ensaio-do-olodum");
        assert_eq!(updated.title, "Ensaio do Olodum (extra)");
    }

    #[tokio::test]
    async fn test_event_writes_invalidate_listings() {
        let (_backend, curation, catalog) = setup();
        assert_eq!(catalog.list_events(EventFilter::default()).await.unwrap().total, 0);

        let created = curation.create_event(event_draft("Lavagem")).await.unwrap();
        assert_eq!(catalog.list_events(EventFilter::default()).await.unwrap().total, 1);

        curation.delete_event(&created.id).await.unwrap();
        assert_eq!(catalog.list_events(EventFilter::default()).await.unwrap().total, 0);
        assert!(matches!(
            curation.delete_event(&created.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_agents_crud_per_kind() {
        let (backend, curation, catalog) = setup();
        let draft = AgentDraft {
            name: "Casa de Shows".to_string(),
            instagram: Some("@casadeshows".to_string()),
            ..Default::default()
        };

        // Venues need a city.
        assert!(matches!(
            curation.create_agent(AgentKind::Venue, draft.clone()).await,
            Err(ServiceError::Validation(_))
        ));

        let artist = curation.create_agent(AgentKind::Artist, draft.clone()).await.unwrap();
        assert_eq!(artist.kind, AgentKind::Artist);
        assert_eq!(artist.slug, "casa-de-shows");
        assert_eq!(artist.instagram.as_deref(), Some("casadeshows"));
        assert_eq!(backend.rows("artists").len(), 1);

        let venue = curation
            .create_agent(
                AgentKind::Venue,
                AgentDraft {
                    city: Some("Belém".to_string()),
                    ..draft
                },
            )
            .await
            .unwrap();
        // Slugs are unique per table, not across kinds.
        assert_eq!(venue.slug, "casa-de-shows");

        let fetched = catalog.get_agent(AgentKind::Venue, "casa-de-shows").await.unwrap();
        assert_eq!(fetched.city.as_deref(), Some("Belém"));

        let renamed = curation
            .update_agent(
                AgentKind::Venue,
                &venue.id,
                AgentDraft {
                    name: "Casa Nova".to_string(),
                    city: Some("Belém".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.slug, "casa-de-shows");
        let fetched = catalog.get_agent(AgentKind::Venue, "casa-de-shows").await.unwrap();
        assert_eq!(fetched.name, "Casa Nova");

        curation.delete_agent(AgentKind::Venue, &venue.id).await.unwrap();
        assert!(catalog.get_agent(AgentKind::Venue, "casa-de-shows").await.is_err());
    }

    #[tokio::test]
    async fn test_highlights_crud_and_reorder() {
        let (_backend, curation, catalog) = setup();
        let e1 = curation.create_event(event_draft("Show Um")).await.unwrap();
        let e2 = curation.create_event(event_draft("Show Dois")).await.unwrap();

        assert!(matches!(
            curation.create_highlight(highlight_draft("missing", 0)).await,
            Err(ServiceError::Validation(_))
        ));

        let h1 = curation.create_highlight(highlight_draft(&e1.id, 0)).await.unwrap();
        let h2 = curation.create_highlight(highlight_draft(&e2.id, 1)).await.unwrap();
        let order = |f: Vec<crate::model::FeaturedEvent>| -> Vec<String> {
            f.into_iter().map(|f| f.highlight_id).collect()
        };
        assert_eq!(
            order(catalog.list_highlights("home").await.unwrap()),
            vec![h1.id.clone(), h2.id.clone()]
        );

        let reordered = curation
            .reorder_highlights("home", &[h2.id.clone(), h1.id.clone()])
            .await
            .unwrap();
        assert_eq!(reordered[0].id, h2.id);
        assert_eq!(reordered[0].position, 0);
        assert_eq!(
            order(catalog.list_highlights("home").await.unwrap()),
            vec![h2.id.clone(), h1.id.clone()]
        );

        assert!(matches!(
            curation.reorder_highlights("home", &[h1.id.clone()]).await,
            Err(ServiceError::BadRequest(_))
        ));

        curation.delete_highlight(&h2.id).await.unwrap();
        assert_eq!(
            order(catalog.list_highlights("home").await.unwrap()),
            vec![h1.id.clone()]
        );
    }

    #[tokio::test]
    async fn test_revista_publish_flow() {
        let (_backend, curation, catalog) = setup();
        let draft = RevistaPostDraft {
            title: "Guia do São João".to_string(),
            body: "Forró, quadrilha e muito milho.".to_string(),
            ..Default::default()
        };
        let post = curation.create_post(draft.clone()).await.unwrap();
        assert_eq!(post.slug, "guia-do-sao-joao");
        assert_eq!(post.status, PublishStatus::Draft);
        assert!(catalog.get_post(&post.slug).await.is_err());

        let published = curation.publish_post(&post.id).await.unwrap();
        let first_stamp = published.published_at.unwrap();
        assert_eq!(catalog.get_post(&post.slug).await.unwrap().id, post.id);

        curation.unpublish_post(&post.id).await.unwrap();
        assert!(catalog.get_post(&post.slug).await.is_err());
        let republished = curation.publish_post(&post.id).await.unwrap();
        assert_eq!(republished.published_at, Some(first_stamp));

        let second = curation.create_post(draft).await.unwrap();
        assert_eq!(second.slug, "guia-do-sao-joao-2");
        assert_eq!(curation.list_posts().await.unwrap().len(), 2);

        curation.delete_post(&second.id).await.unwrap();
        assert!(matches!(
            curation.publish_post(&second.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
