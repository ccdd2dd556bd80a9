//! Follows, attendance, reviews and comments of authenticated users.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::error::{Result, ServiceError};
use super::read_cache::ReadCache;
use crate::backend::{fetch, fetch_one, Backend, Query};
use crate::model::social::{
    ATTENDANCE_TABLE, COMMENTS_TABLE, FOLLOWS_TABLE, REVIEWS_TABLE, SOCIAL_COUNTS_RPC,
};
use crate::model::{
    Attendance, AttendanceStatus, AuthUser, Comment, EntityRef, EntityType, Review, SocialCounts,
};
use crate::schema::{CommentInput, ReviewInput, Validate};

/// Cache prefix of everything derived from one entity's social data.
pub fn cache_prefix(entity: &EntityRef) -> String {
    format!("social:{}:", entity.key())
}

/// RPC answers are a row, a one-row array or null depending on the function's return type.
pub fn decode_counts(value: Value) -> Result<SocialCounts> {
    let row = match value {
        Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
        Value::Array(_) | Value::Null => return Ok(SocialCounts::default()),
        other => other,
    };
    Ok(serde_json::from_value(row)?)
}

/// Aggregate counters of `entity`, cached.
pub async fn load_counts(
    backend: &dyn Backend,
    cache: &ReadCache,
    entity: &EntityRef,
) -> Result<SocialCounts> {
    let key = format!("{}counts", cache_prefix(entity));
    cache
        .get_or_fetch(&key, || async {
            let params = json!({
                "p_entity_type": entity.entity_type,
                "p_entity_id": entity.entity_id,
            });
            decode_counts(backend.rpc(SOCIAL_COUNTS_RPC, params).await?)
        })
        .await
}

pub struct Social {
    backend: Arc<dyn Backend>,
    cache: ReadCache,
}

impl Social {
    pub fn new(backend: Arc<dyn Backend>, cache: ReadCache) -> Self {
        Self { backend, cache }
    }

    fn touched(&self, entity: &EntityRef) {
        self.cache.invalidate(&[cache_prefix(entity).as_str()]);
    }

    pub async fn counts(&self, entity: &EntityRef) -> Result<SocialCounts> {
        load_counts(self.backend.as_ref(), &self.cache, entity).await
    }

    /// Following twice is a no-op.
    pub async fn follow(&self, user: &AuthUser, entity: &EntityRef) -> Result<()> {
        let row = json!({
            "user_id": user.id,
            "entity_type": entity.entity_type,
            "entity_id": entity.entity_id,
        });
        self.backend
            .upsert(FOLLOWS_TABLE, row, &["user_id", "entity_type", "entity_id"])
            .await?;
        info!(component = "social", event = "follow", user = %user.id, entity = %entity.key(), "followed");
        self.touched(entity);
        Ok(())
    }

    /// Unfollowing something not followed is a no-op.
    pub async fn unfollow(&self, user: &AuthUser, entity: &EntityRef) -> Result<()> {
        let q = Query::new()
            .eq("user_id", user.id.as_str())
            .eq("entity_type", entity.entity_type.as_str())
            .eq("entity_id", entity.entity_id.as_str());
        self.backend.delete(FOLLOWS_TABLE, &q).await?;
        info!(component = "social", event = "unfollow", user = %user.id, entity = %entity.key(), "unfollowed");
        self.touched(entity);
        Ok(())
    }

    pub async fn is_following(&self, user: &AuthUser, entity: &EntityRef) -> Result<bool> {
        let q = Query::new()
            .eq("user_id", user.id.as_str())
            .eq("entity_type", entity.entity_type.as_str())
            .eq("entity_id", entity.entity_id.as_str())
            .limit(1);
        Ok(!self.backend.select(FOLLOWS_TABLE, &q).await?.is_empty())
    }

    pub async fn set_attendance(
        &self,
        user: &AuthUser,
        event_id: &str,
        status: AttendanceStatus,
    ) -> Result<Attendance> {
        let row = json!({
            "user_id": user.id,
            "event_id": event_id,
            "status": status,
            "updated_at": crate::time::now_utc(),
        });
        let stored = self
            .backend
            .upsert(ATTENDANCE_TABLE, row, &["user_id", "event_id"])
            .await?;
        self.touched(&EntityRef::new(EntityType::Event, event_id));
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn clear_attendance(&self, user: &AuthUser, event_id: &str) -> Result<()> {
        let q = Query::new()
            .eq("user_id", user.id.as_str())
            .eq("event_id", event_id);
        self.backend.delete(ATTENDANCE_TABLE, &q).await?;
        self.touched(&EntityRef::new(EntityType::Event, event_id));
        Ok(())
    }

    /// One review per user and entity; a second review replaces the first.
    pub async fn add_review(
        &self,
        user: &AuthUser,
        entity: &EntityRef,
        input: ReviewInput,
    ) -> Result<Review> {
        let input = input.clean()?;
        let row = json!({
            "user_id": user.id,
            "entity_type": entity.entity_type,
            "entity_id": entity.entity_id,
            "rating": input.rating,
            "comment": input.comment,
        });
        let stored = self
            .backend
            .upsert(REVIEWS_TABLE, row, &["user_id", "entity_type", "entity_id"])
            .await?;
        self.touched(entity);
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn list_reviews(&self, entity: &EntityRef) -> Result<Vec<Review>> {
        let key = format!("{}reviews", cache_prefix(entity));
        self.cache
            .get_or_fetch(&key, || async {
                let q = of_entity(entity).order("created_at", false);
                Ok::<_, ServiceError>(fetch(self.backend.as_ref(), REVIEWS_TABLE, &q).await?)
            })
            .await
    }

    pub async fn add_comment(
        &self,
        user: &AuthUser,
        entity: &EntityRef,
        input: CommentInput,
    ) -> Result<Comment> {
        let input = input.clean()?;
        let row = json!({
            "user_id": user.id,
            "entity_type": entity.entity_type,
            "entity_id": entity.entity_id,
            "body": input.body,
        });
        let stored = self.backend.insert(COMMENTS_TABLE, row).await?;
        self.touched(entity);
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn list_comments(&self, entity: &EntityRef) -> Result<Vec<Comment>> {
        let key = format!("{}comments", cache_prefix(entity));
        self.cache
            .get_or_fetch(&key, || async {
                let q = of_entity(entity).order("created_at", true);
                Ok::<_, ServiceError>(fetch(self.backend.as_ref(), COMMENTS_TABLE, &q).await?)
            })
            .await
    }

    /// Only the author or an admin may delete a comment.
    pub async fn delete_comment(&self, user: &AuthUser, id: &str) -> Result<()> {
        let comment: Comment = fetch_one(
            self.backend.as_ref(),
            COMMENTS_TABLE,
            Query::new().eq("id", id),
        )
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("comment {}", id)))?;

        if comment.user_id != user.id && !user.is_admin {
            return Err(ServiceError::Forbidden);
        }

        self.backend
            .delete(COMMENTS_TABLE, &Query::new().eq("id", id))
            .await?;
        info!(
            component = "social",
            event = "comment_deleted",
            id,
            by_admin = comment.user_id != user.id,
            "comment deleted"
        );
        self.touched(&EntityRef::new(comment.entity_type, comment.entity_id));
        Ok(())
    }
}

fn of_entity(entity: &EntityRef) -> Query {
    Query::new()
        .eq("entity_type", entity.entity_type.as_str())
        .eq("entity_id", entity.entity_id.as_str())
}
