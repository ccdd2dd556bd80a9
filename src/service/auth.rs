// Bearer-token authentication against the backend's session store.

use axum::http::{header, HeaderMap};

use super::error::{Result, ServiceError};
use crate::backend::Backend;
use crate::model::AuthUser;

/// Token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Resolves the caller; missing or unknown tokens are `Unauthorized`.
pub async fn authenticate(backend: &dyn Backend, headers: &HeaderMap) -> Result<AuthUser> {
    let token = bearer_token(headers).ok_or(ServiceError::Unauthorized)?;
    backend
        .auth_user(token)
        .await?
        .ok_or(ServiceError::Unauthorized)
}

/// Resolves the caller and requires the admin role.
pub async fn authenticate_admin(backend: &dyn Backend, headers: &HeaderMap) -> Result<AuthUser> {
    let user = authenticate(backend, headers).await?;
    if !user.is_admin {
        return Err(ServiceError::Forbidden);
    }
    Ok(user)
}
