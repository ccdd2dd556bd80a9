//! Follows, attendance, reviews and comments.
//!
//! Reads are public; writes resolve the caller from the bearer token.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::request::json_body;
use crate::backend::Backend;
use crate::http::Controller;
use crate::model::{AttendanceStatus, AuthUser, Comment, EntityRef, EntityType, Review, SocialCounts};
use crate::schema::{CommentInput, ReviewInput};
use crate::service::{auth, Result, ServiceError, Social};

#[derive(Debug, Serialize)]
struct FollowState {
    following: bool,
}

#[derive(Debug, Deserialize)]
struct AttendanceBody {
    status: AttendanceStatus,
}

fn entity(entity_type: &str, entity_id: String) -> Result<EntityRef> {
    let entity_type: EntityType = entity_type
        .parse()
        .map_err(|_| ServiceError::not_found(format!("entity type {}", entity_type)))?;
    Ok(EntityRef::new(entity_type, entity_id))
}

pub struct SocialController {
    backend: Arc<dyn Backend>,
    social: Arc<Social>,
}

impl SocialController {
    pub fn new(backend: Arc<dyn Backend>, social: Arc<Social>) -> Self {
        Self { backend, social }
    }

    async fn user(&self, headers: &HeaderMap) -> Result<AuthUser> {
        auth::authenticate(self.backend.as_ref(), headers).await
    }

    async fn counts(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
    ) -> Result<Json<SocialCounts>> {
        let entity = entity(&entity_type, entity_id)?;
        Ok(Json(controller.social.counts(&entity).await?))
    }

    async fn is_following(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<Json<FollowState>> {
        let user = controller.user(&headers).await?;
        let entity = entity(&entity_type, entity_id)?;
        let following = controller.social.is_following(&user, &entity).await?;
        Ok(Json(FollowState { following }))
    }

    async fn follow(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<Json<FollowState>> {
        let user = controller.user(&headers).await?;
        let entity = entity(&entity_type, entity_id)?;
        controller.social.follow(&user, &entity).await?;
        Ok(Json(FollowState { following: true }))
    }

    async fn unfollow(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<Json<FollowState>> {
        let user = controller.user(&headers).await?;
        let entity = entity(&entity_type, entity_id)?;
        controller.social.unfollow(&user, &entity).await?;
        Ok(Json(FollowState { following: false }))
    }

    async fn list_reviews(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
    ) -> Result<Json<Vec<Review>>> {
        let entity = entity(&entity_type, entity_id)?;
        Ok(Json(controller.social.list_reviews(&entity).await?))
    }

    async fn add_review(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
        headers: HeaderMap,
        body: std::result::Result<Json<ReviewInput>, JsonRejection>,
    ) -> Result<impl IntoResponse> {
        let user = controller.user(&headers).await?;
        let entity = entity(&entity_type, entity_id)?;
        let review = controller.social.add_review(&user, &entity, json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(review)))
    }

    async fn list_comments(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
    ) -> Result<Json<Vec<Comment>>> {
        let entity = entity(&entity_type, entity_id)?;
        Ok(Json(controller.social.list_comments(&entity).await?))
    }

    async fn add_comment(
        State(controller): State<Arc<Self>>,
        Path((entity_type, entity_id)): Path<(String, String)>,
        headers: HeaderMap,
        body: std::result::Result<Json<CommentInput>, JsonRejection>,
    ) -> Result<impl IntoResponse> {
        let user = controller.user(&headers).await?;
        let entity = entity(&entity_type, entity_id)?;
        let comment = controller.social.add_comment(&user, &entity, json_body(body)?).await?;
        Ok((StatusCode::CREATED, Json(comment)))
    }

    async fn delete_comment(
        State(controller): State<Arc<Self>>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Result<StatusCode> {
        let user = controller.user(&headers).await?;
        controller.social.delete_comment(&user, &id).await?;
        Ok(StatusCode::NO_CONTENT)
    }

    async fn set_attendance(
        State(controller): State<Arc<Self>>,
        Path(event_id): Path<String>,
        headers: HeaderMap,
        body: std::result::Result<Json<AttendanceBody>, JsonRejection>,
    ) -> Result<impl IntoResponse> {
        let user = controller.user(&headers).await?;
        let body = json_body(body)?;
        let attendance = controller
            .social
            .set_attendance(&user, &event_id, body.status)
            .await?;
        Ok(Json(attendance))
    }

    async fn clear_attendance(
        State(controller): State<Arc<Self>>,
        Path(event_id): Path<String>,
        headers: HeaderMap,
    ) -> Result<StatusCode> {
        let user = controller.user(&headers).await?;
        controller.social.clear_attendance(&user, &event_id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

impl Controller for SocialController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route(
                "/api/social/:entity_type/:entity_id/counts",
                get(Self::counts),
            )
            .route(
                "/api/social/:entity_type/:entity_id/follow",
                get(Self::is_following)
                    .put(Self::follow)
                    .delete(Self::unfollow),
            )
            .route(
                "/api/social/:entity_type/:entity_id/reviews",
                get(Self::list_reviews).post(Self::add_review),
            )
            .route(
                "/api/social/:entity_type/:entity_id/comments",
                get(Self::list_comments).post(Self::add_comment),
            )
            .route("/api/comments/:id", delete(Self::delete_comment))
            .route(
                "/api/attendance/:event_id",
                put(Self::set_attendance).delete(Self::clear_attendance),
            )
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for SocialController {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            social: self.social.clone(),
        }
    }
}
