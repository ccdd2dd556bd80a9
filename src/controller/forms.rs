//! Public form intake: newsletter sign-ups and job applications.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

use super::request::client_ip;
use crate::http::Controller;
use crate::schema::{JobApplicationForm, NewsletterForm};
use crate::service::{Forms, Result, ServiceError};

pub const NEWSLETTER_PATH: &str = "/functions/newsletter";
pub const JOB_APPLICATION_PATH: &str = "/functions/job-application";

pub struct FormsController {
    forms: Arc<Forms>,
}

impl FormsController {
    pub fn new(forms: Arc<Forms>) -> Self {
        Self { forms }
    }

    async fn newsletter(
        State(controller): State<Arc<Self>>,
        peer: Option<ConnectInfo<SocketAddr>>,
        headers: HeaderMap,
        body: std::result::Result<Json<NewsletterForm>, JsonRejection>,
    ) -> Result<impl IntoResponse> {
        let client = client_ip(&headers, peer.as_ref());
        // Malformed bodies still count against the client's budget.
        let form = match body {
            Ok(Json(form)) => form,
            Err(rejection) => {
                controller.forms.admit_newsletter(&client)?;
                return Err(ServiceError::BadRequest(rejection.body_text()));
            }
        };
        controller.forms.subscribe_newsletter(&client, form).await?;
        Ok((StatusCode::OK, Json(json!({ "ok": true }))))
    }

    async fn job_application(
        State(controller): State<Arc<Self>>,
        peer: Option<ConnectInfo<SocketAddr>>,
        headers: HeaderMap,
        body: std::result::Result<Json<JobApplicationForm>, JsonRejection>,
    ) -> Result<impl IntoResponse> {
        let client = client_ip(&headers, peer.as_ref());
        let form = match body {
            Ok(Json(form)) => form,
            Err(rejection) => {
                controller.forms.admit_job_application(&client)?;
                return Err(ServiceError::BadRequest(rejection.body_text()));
            }
        };
        let id = controller.forms.submit_job_application(&client, form).await?;
        Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": id }))))
    }
}

impl Controller for FormsController {
    fn add_route(&self, router: Router) -> Router {
        let routes = Router::new()
            .route(NEWSLETTER_PATH, post(Self::newsletter))
            .route(JOB_APPLICATION_PATH, post(Self::job_application))
            .with_state(Arc::new(self.clone()));
        router.merge(routes)
    }
}

impl Clone for FormsController {
    fn clone(&self) -> Self {
        Self {
            forms: self.forms.clone(),
        }
    }
}
