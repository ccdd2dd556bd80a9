//! One-shot request/response over the shared hyper client.

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::{HeaderMap, Method, Request, Uri};
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

use super::HyperClient;

/// Status, headers and collected body of a response.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, truncated for logs and error messages.
    pub fn body_snippet(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        text.chars().take(512).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("invalid request: {0}")]
    Build(#[from] hyper::http::Error),
    #[error("request to {uri} failed: {message}")]
    Transport { uri: String, message: String },
    #[error("request to {uri} timed out after {timeout:?}")]
    Timeout { uri: String, timeout: Duration },
}

/// Sends a request with an optional body and collects the whole response.
pub async fn send(
    client: &HyperClient,
    method: Method,
    uri: Uri,
    headers: &[(&str, String)],
    body: Option<Bytes>,
    timeout_duration: Duration,
) -> Result<Reply, SendError> {
    let uri_str = uri.to_string();

    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }

    let req_body: BoxBody<Bytes, hyper::Error> = match body {
        Some(bytes) => Full::new(bytes)
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed(),
        None => Empty::<Bytes>::new()
            .map_err(|never: std::convert::Infallible| match never {})
            .boxed(),
    };

    let req = builder.body(req_body)?;

    let response = match timeout(timeout_duration, client.request(req)).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            return Err(SendError::Transport {
                uri: uri_str,
                message: e.to_string(),
            });
        }
        Err(_) => {
            warn!(
                component = "http_client",
                uri = %uri_str,
                timeout = ?timeout_duration,
                "request timed out"
            );
            return Err(SendError::Timeout {
                uri: uri_str,
                timeout: timeout_duration,
            });
        }
    };

    let status = response.status().as_u16();
    let (parts, incoming) = response.into_parts();
    let body = incoming
        .collect()
        .await
        .map_err(|e| SendError::Transport {
            uri: uri_str.clone(),
            message: format!("failed to read response body: {}", e),
        })?
        .to_bytes();

    Ok(Reply {
        status,
        headers: parts.headers,
        body,
    })
}
