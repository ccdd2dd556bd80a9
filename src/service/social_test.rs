#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::backend::MemoryBackend;
    use crate::cache::TtlCache;
    use crate::model::{AttendanceStatus, AuthUser, EntityRef, EntityType};
    use crate::schema::{CommentInput, ReviewInput};
    use crate::service::{ReadCache, ServiceError, Social};

    fn user(id: &str, is_admin: bool) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: None,
            is_admin,
        }
    }

    fn social() -> (Arc<MemoryBackend>, Social) {
        let backend = Arc::new(MemoryBackend::new());
        let cache = ReadCache::new(Arc::new(TtlCache::new("test", Duration::from_secs(60), 64)));
        (backend.clone(), Social::new(backend, cache))
    }

    #[tokio::test]
    async fn test_follow_is_idempotent_and_invalidates_counts() {
        let (backend, social) = social();
        let venue = EntityRef::new(EntityType::Venue, "v1");
        let ana = user("ana", false);

        assert_eq!(social.counts(&venue).await.unwrap().followers, 0);

        social.follow(&ana, &venue).await.unwrap();
        social.follow(&ana, &venue).await.unwrap();
        assert_eq!(backend.rows("follows").len(), 1);
        assert!(social.is_following(&ana, &venue).await.unwrap());
        assert_eq!(social.counts(&venue).await.unwrap().followers, 1);

        social.unfollow(&ana, &venue).await.unwrap();
        social.unfollow(&ana, &venue).await.unwrap();
        assert_eq!(social.counts(&venue).await.unwrap().followers, 0);
    }

    #[tokio::test]
    async fn test_attendance_replaces_status() {
        let (backend, social) = social();
        let ana = user("ana", false);

        social
            .set_attendance(&ana, "e1", AttendanceStatus::Interested)
            .await
            .unwrap();
        let stored = social
            .set_attendance(&ana, "e1", AttendanceStatus::Going)
            .await
            .unwrap();
        assert_eq!(stored.status, AttendanceStatus::Going);
        assert_eq!(backend.rows("event_attendance").len(), 1);

        let event = EntityRef::new(EntityType::Event, "e1");
        let counts = social.counts(&event).await.unwrap();
        assert_eq!((counts.going, counts.interested), (1, 0));

        social.clear_attendance(&ana, "e1").await.unwrap();
        assert_eq!(social.counts(&event).await.unwrap().going, 0);
    }

    #[tokio::test]
    async fn test_one_review_per_user_and_entity() {
        let (_backend, social) = social();
        let artist = EntityRef::new(EntityType::Artist, "a1");

        social
            .add_review(&user("ana", false), &artist, ReviewInput { rating: 2, comment: None })
            .await
            .unwrap();
        let updated = social
            .add_review(
                &user("ana", false),
                &artist,
                ReviewInput {
                    rating: 4,
                    comment: Some("  melhorou ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.comment.as_deref(), Some("melhorou"));
        social
            .add_review(&user("bia", false), &artist, ReviewInput { rating: 5, comment: None })
            .await
            .unwrap();

        let counts = social.counts(&artist).await.unwrap();
        assert_eq!(counts.reviews, 2);
        assert_eq!(counts.average_rating, Some(4.5));
        assert_eq!(social.list_reviews(&artist).await.unwrap().len(), 2);

        let invalid = social
            .add_review(&user("ana", false), &artist, ReviewInput { rating: 9, comment: None })
            .await;
        assert!(matches!(invalid, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_comment_deletion_rules() {
        let (_backend, social) = social();
        let post = EntityRef::new(EntityType::Post, "p1");
        let ana = user("ana", false);

        let c1 = social
            .add_comment(&ana, &post, CommentInput { body: "primeiro!".to_string() })
            .await
            .unwrap();
        let c2 = social
            .add_comment(&ana, &post, CommentInput { body: "segundo".to_string() })
            .await
            .unwrap();
        assert_eq!(social.list_comments(&post).await.unwrap().len(), 2);

        assert!(matches!(
            social.delete_comment(&user("bia", false), &c1.id).await,
            Err(ServiceError::Forbidden)
        ));
        social.delete_comment(&ana, &c1.id).await.unwrap();
        social.delete_comment(&user("root", true), &c2.id).await.unwrap();
        assert!(matches!(
            social.delete_comment(&ana, &c2.id).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(social.list_comments(&post).await.unwrap().is_empty());
    }
}
