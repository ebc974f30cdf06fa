use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
}

/// A fully resolved request ready to be sent.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

/// Captured response. Header lookups are case-insensitive.
#[derive(Debug, Clone, Serialize)]
pub struct ActualResponse {
    pub status: u16,
    pub body: String,
    #[serde(serialize_with = "serialize_headers")]
    pub headers: HeaderMap,
}

impl ActualResponse {
    pub fn new<T: Into<String>>(status: u16, body: T) -> Self {
        Self {
            status,
            body: body.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Add a header, ignoring names or values that are not valid HTTP.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// First value of `name`, or `""` when absent.
    pub fn header(&self, name: &str) -> String {
        self.headers
            .get(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .unwrap_or_default()
    }
}

fn serialize_headers<S: Serializer>(headers: &HeaderMap, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(headers.keys_len()))?;
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.serialize_entry(name.as_str(), &joined)?;
    }
    map.end()
}

/// Shared client used by every case of a run. Must be safe for concurrent use.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<ActualResponse, TransportError>;
}

/// `reqwest`-backed transport; one client (and connection pool) per run.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apiprobe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| TransportError::Request(format!("failed to build HTTP client: {}", err)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<ActualResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(ActualResponse {
            status,
            body,
            headers,
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(err.to_string())
    }
}
