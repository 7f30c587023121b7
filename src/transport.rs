use std::fmt;
use std::fs;
use std::io;
use std::sync::Arc;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::NetaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A single outbound call: method, absolute URL, query parameters and an
/// optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post<B: Serialize>(url: impl Into<String>, body: &B) -> Result<Self, NetaError> {
        let body = serde_json::to_value(body)
            .map_err(|err| NetaError::InvalidRequest(err.to_string()))?;
        Ok(Self {
            method: Method::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        })
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Issues one request and decodes the JSON body. No retries.
pub trait Transport: Send + Sync {
    fn request(&self, request: &RequestDescriptor) -> Result<Value, NetaError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(&self, request: &RequestDescriptor) -> Result<Value, NetaError> {
        (**self).request(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn request(&self, request: &RequestDescriptor) -> Result<Value, NetaError> {
        (**self).request(request)
    }
}

/// `reqwest` backed transport. `file://` URLs are served from disk so a
/// static snapshot directory works without any server.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, NetaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("neta-client/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| NetaError::InvalidConfig(err.to_string()))?,
        );
        // No deadline unless configured: a hung primary never falls back.
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|err| NetaError::Network(err.to_string()))?;
        Ok(Self { client })
    }

    fn send_http(&self, url: Url, request: &RequestDescriptor) -> Result<Value, NetaError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|err| NetaError::Network(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| NetaError::Network(err.to_string()))?;
        if !status.is_success() {
            let message = error_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(NetaError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&text).map_err(NetaError::decode)
    }
}

impl Transport for HttpTransport {
    fn request(&self, request: &RequestDescriptor) -> Result<Value, NetaError> {
        let url = Url::parse(&request.url)
            .map_err(|err| NetaError::InvalidRequest(format!("{}: {err}", request.url)))?;
        tracing::debug!(method = %request.method, url = %url, "sending request");
        if url.scheme() == "file" {
            return read_snapshot(&url);
        }
        self.send_http(url, request)
    }
}

pub fn read_snapshot(url: &Url) -> Result<Value, NetaError> {
    let path = url
        .to_file_path()
        .map_err(|_| NetaError::InvalidRequest(format!("not a local snapshot path: {url}")))?;
    let content = fs::read_to_string(&path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => NetaError::HttpStatus {
            status: 404,
            message: format!("snapshot not found: {}", path.display()),
        },
        _ => NetaError::Snapshot(format!("{}: {err}", path.display())),
    })?;
    serde_json::from_str(&content).map_err(NetaError::decode)
}

/// Prefers the backend's `{"error": ...}` field over the raw body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<Value>(trimmed).ok().and_then(|value| {
        ["error", "message"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
    });
    Some(from_json.unwrap_or_else(|| trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn error_message_prefers_backend_field() {
        let body = r#"{"task_id": 4, "status": "failed", "error": "R script failed"}"#;
        assert_eq!(error_message(body).as_deref(), Some("R script failed"));
        assert_eq!(error_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_message("  "), None);
    }

    #[test]
    fn snapshot_missing_file_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(temp.path().join("datasets.json")).unwrap();
        let err = read_snapshot(&url).unwrap_err();
        assert_matches!(err, NetaError::HttpStatus { status: 404, .. });
    }

    #[test]
    fn snapshot_with_invalid_json_is_decode_failure() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("stats.json");
        fs::write(&path, "<html>").unwrap();
        let err = read_snapshot(&Url::from_file_path(&path).unwrap()).unwrap_err();
        assert_matches!(err, NetaError::Decode(_));
    }

    #[test]
    fn descriptor_builders() {
        let request = RequestDescriptor::get("http://localhost:5000/api/genes/search")
            .with_query("q", "TP53 & co")
            .with_query("limit", 50);
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.query,
            vec![
                ("q".to_string(), "TP53 & co".to_string()),
                ("limit".to_string(), "50".to_string())
            ]
        );
        assert!(request.body.is_none());
    }
}
