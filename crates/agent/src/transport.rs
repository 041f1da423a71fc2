use crate::error::{AppError, ErrorKind};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Body,
    Other,
}

#[derive(Debug, Error)]
#[error("transport failure ({kind:?}): {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let kind = if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        // Strip the URL so query strings never reach the logs.
        Self::new(kind, error.without_url().to_string())
    }
}

impl From<TransportError> for AppError {
    fn from(error: TransportError) -> Self {
        let internal = error.to_string();
        let mapped = match error.kind {
            TransportErrorKind::Connect => AppError::new(
                ErrorKind::Network,
                "Network error. Please check your connection and try again.",
            ),
            TransportErrorKind::Timeout => AppError::new(
                ErrorKind::Timeout,
                "Request timed out. The operation may still be processing.",
            ),
            TransportErrorKind::Body | TransportErrorKind::Other => AppError::new(
                ErrorKind::Unknown,
                "An error occurred while communicating with the service.",
            ),
        };
        mapped.with_internal(internal)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest, bearer: &str) -> Result<ApiResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(30))
    }
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Self {
        let http = Client::builder()
            .user_agent(concat!("agentcord/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest, bearer: &str) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method, request.url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(bearer);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse { status, body })
    }
}
