use crate::error::AppError;
use crate::transport::{ApiRequest, ReqwestTransport, Transport};
use crate::types::{
    Agent, AgentIdResponse, AgentListResponse, ApiKeyInfo, ConversationResponse, FollowUpRequest,
    LaunchAgentRequest, ModelsResponse, RepositoriesResponse,
};
use anyhow::{anyhow, Result};
use rand::Rng;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.cursor.com";
const MAX_RETRIES: u32 = 3;
const BASE_DELAY_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 30_000;
const MAX_JITTER: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, attempt: u32) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..=MAX_JITTER);
        self.backoff_with_jitter(attempt, jitter)
    }

    /// `min(max_delay, base_delay * 2^attempt)` plus `jitter` (a fraction,
    /// at most 0.25) of that capped value. Jitter only ever adds.
    pub fn backoff_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let capped = exponential.min(self.max_delay);
        capped + capped.mul_f64(jitter.clamp(0.0, MAX_JITTER))
    }
}

async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempts >= policy.max_retries || !e.is_retryable() {
                    return Err(e);
                }
                let delay = policy.backoff(attempts);
                tracing::debug!(
                    attempt = attempts,
                    ?delay,
                    kind = ?e.kind(),
                    status = ?e.status(),
                    "Retrying after error: {e}"
                );
                tokio::time::sleep(delay).await;
                attempts += 1;
            }
        }
    }
}

/// Remote error bodies are read defensively: anything that is not a JSON
/// object with a `message` or `error` string yields `None`.
fn error_detail(body: &[u8]) -> Option<String> {
    let data: Value = serde_json::from_slice(body).unwrap_or(Value::Object(Default::default()));
    data.get("message")
        .and_then(|v| v.as_str())
        .or_else(|| data.get("error").and_then(|v| v.as_str()))
        .map(String::from)
}

#[derive(Clone)]
pub struct CloudAgentClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    api_token: String,
    retry: RetryPolicy,
}

impl CloudAgentClient {
    pub fn new(base_url: &str, api_token: impl Into<String>) -> Result<Self> {
        Self::with_transport(Arc::new(ReqwestTransport::default()), base_url, api_token)
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        base_url: &str,
        api_token: impl Into<String>,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base URL cannot carry paths: {base_url}"));
        }
        Ok(Self {
            transport,
            base_url,
            api_token: api_token.into(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Every segment is percent-encoded by `Url`, so ids can never escape
    /// their path position.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T, AppError> {
        with_retry(&self.retry, || {
            let request = ApiRequest {
                method: method.clone(),
                url: url.clone(),
                body: body.clone(),
            };
            async move { self.execute(request).await }
        })
        .await
    }

    async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, AppError> {
        let path = request.url.path().to_string();
        let response = self.transport.send(request, &self.api_token).await?;

        if !response.is_success() {
            return Err(AppError::from_status(
                response.status,
                error_detail(&response.body),
            ));
        }

        serde_json::from_slice(&response.body).map_err(|e| {
            AppError::unexpected("undecodable response body")
                .with_internal(format!("failed to decode response from {path}: {e}"))
        })
    }

    fn encode_body<B: Serialize>(body: &B) -> Result<Value, AppError> {
        serde_json::to_value(body).map_err(|e| {
            AppError::unexpected("unencodable request body")
                .with_internal(format!("failed to encode request body: {e}"))
        })
    }

    pub async fn list_agents(
        &self,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> Result<AgentListResponse, AppError> {
        let mut url = self.endpoint(&["v0", "agents"]);
        if limit.is_some() || cursor.is_some() {
            let mut query = url.query_pairs_mut();
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
            if let Some(cursor) = cursor {
                query.append_pair("cursor", cursor);
            }
        }
        self.request(Method::GET, url, None).await
    }

    pub async fn get_agent(&self, id: &str) -> Result<Agent, AppError> {
        let url = self.endpoint(&["v0", "agents", id]);
        self.request(Method::GET, url, None).await
    }

    pub async fn get_conversation(&self, id: &str) -> Result<ConversationResponse, AppError> {
        let url = self.endpoint(&["v0", "agents", id, "conversation"]);
        self.request(Method::GET, url, None).await
    }

    pub async fn launch_agent(
        &self,
        payload: &LaunchAgentRequest,
    ) -> Result<AgentIdResponse, AppError> {
        let url = self.endpoint(&["v0", "agents"]);
        let body = Self::encode_body(payload)?;
        self.request(Method::POST, url, Some(body)).await
    }

    pub async fn follow_up(
        &self,
        id: &str,
        payload: &FollowUpRequest,
    ) -> Result<AgentIdResponse, AppError> {
        let url = self.endpoint(&["v0", "agents", id, "followup"]);
        let body = Self::encode_body(payload)?;
        self.request(Method::POST, url, Some(body)).await
    }

    pub async fn stop_agent(&self, id: &str) -> Result<AgentIdResponse, AppError> {
        let url = self.endpoint(&["v0", "agents", id, "stop"]);
        self.request(Method::POST, url, None).await
    }

    pub async fn delete_agent(&self, id: &str) -> Result<AgentIdResponse, AppError> {
        let url = self.endpoint(&["v0", "agents", id]);
        self.request(Method::DELETE, url, None).await
    }

    pub async fn list_models(&self) -> Result<ModelsResponse, AppError> {
        let url = self.endpoint(&["v0", "models"]);
        self.request(Method::GET, url, None).await
    }

    /// The remote side limits this endpoint to 1 request/minute and 30/hour.
    /// Nothing is enforced locally; a 429 goes through the normal retry path.
    pub async fn list_repositories(&self) -> Result<RepositoriesResponse, AppError> {
        let url = self.endpoint(&["v0", "repositories"]);
        self.request(Method::GET, url, None).await
    }

    pub async fn get_api_key_info(&self) -> Result<ApiKeyInfo, AppError> {
        let url = self.endpoint(&["v0", "me"]);
        self.request(Method::GET, url, None).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub(crate) type Scripted = Result<ApiResponse, TransportError>;

    pub(crate) fn json_response(status: u16, body: serde_json::Value) -> Scripted {
        Ok(ApiResponse {
            status,
            body: body.to_string().into_bytes(),
        })
    }

    /// Replays scripted results in order; once exhausted, keeps repeating the
    /// fallback.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        fallback: fn() -> Scripted,
        pub(crate) requests: Mutex<Vec<(ApiRequest, String)>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Scripted>, fallback: fn() -> Scripted) -> Self {
            Self {
                script: Mutex::new(script.into()),
                fallback,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            request: ApiRequest,
            bearer: &str,
        ) -> Result<ApiResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((request, bearer.to_string()));
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(self.fallback)
        }
    }
}
