// Request helpers shared by controllers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Query};
use axum::http::HeaderMap;
use axum::Json;
use std::net::SocketAddr;

use crate::service::{Result, ServiceError};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_REAL_IP: &str = "x-real-ip";

/// Unwraps a JSON body, turning syntax and content-type errors into `400`.
pub fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ServiceError::BadRequest(rejection.body_text())),
    }
}

/// Unwraps query parameters, turning parse errors into `400`.
pub fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    match query {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => Err(ServiceError::BadRequest(rejection.body_text())),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client address for rate limiting: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> String {
    if let Some(first) = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = header_str(headers, X_REAL_IP) {
        return real.to_string();
    }
    peer.map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
