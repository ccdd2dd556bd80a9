// Common request helpers for end-to-end tests.

use reqwest::header::HeaderMap;
use serde_json::Value;
use std::time::Duration;

/// Status, headers and JSON body (`Null` when the body is empty or not JSON).
pub struct Reply {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Value,
}

impl Reply {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("failed to build http client")
}

/// Sends a request with an optional bearer token, extra headers and JSON body.
pub async fn do_request(
    method: &str,
    url: &str,
    token: Option<&str>,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> Reply {
    let client = client();
    let mut request = match method {
        "GET" => client.get(url),
        "POST" => client.post(url),
        "PUT" => client.put(url),
        "DELETE" => client.delete(url),
        _ => panic!("unsupported method: {}", method),
    };

    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    for (k, v) in headers {
        request = request.header(*k, *v);
    }
    if let Some(body) = body {
        request = request.json(&body);
    }

    let resp = request.send().await.expect("request failed");
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await.expect("failed to read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Reply {
        status,
        headers,
        body,
    }
}

pub async fn get(url: &str, token: Option<&str>) -> Reply {
    do_request("GET", url, token, &[], None).await
}

pub async fn post(url: &str, token: Option<&str>, body: Value) -> Reply {
    do_request("POST", url, token, &[], Some(body)).await
}

pub async fn put(url: &str, token: Option<&str>, body: Value) -> Reply {
    do_request("PUT", url, token, &[], Some(body)).await
}

pub async fn delete(url: &str, token: Option<&str>) -> Reply {
    do_request("DELETE", url, token, &[], None).await
}

/// Slugs of the `items` of a page body.
pub fn slugs(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i["slug"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Posts a raw body labelled as JSON, for malformed-payload cases.
pub async fn post_raw(url: &str, headers: &[(&str, &str)], body: &str) -> Reply {
    let mut request = client()
        .post(url)
        .header("content-type", "application/json")
        .body(body.to_string());
    for (k, v) in headers {
        request = request.header(*k, *v);
    }
    let resp = request.send().await.expect("request failed");
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await.expect("failed to read body");
    Reply {
        status,
        headers,
        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
    }
}
