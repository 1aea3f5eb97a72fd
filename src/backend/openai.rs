//! Live client for OpenAI-compatible APIs.
//!
//! [`LiveClient`] talks to OpenAI or any server exposing the same
//! `chat/completions` and `models` endpoints (vLLM, llama.cpp server,
//! LM Studio, Ollama's `/v1/`, ...). The base URL is the full API root,
//! version segment included, and endpoint paths are joined onto it as-is.
//!
//! Every prompt is sent as a single user message. Without an API key the
//! client refuses to make network calls and reports
//! [`PipelineError::NotConfigured`].

use super::{CompletionClient, DEFAULT_MODEL};
use crate::error::{BackendError, PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Default endpoint when `OPENAI_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default request timeout for the HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for any OpenAI-compatible API.
///
/// # Example
///
/// ```
/// use orai::backend::LiveClient;
///
/// let client = LiveClient::builder("https://api.openai.com/v1/")
///     .api_key("sk-...")
///     .default_model("gpt-4o-mini")
///     .build()
///     .unwrap();
/// assert_eq!(client.base_url(), "https://api.openai.com/v1");
/// ```
#[derive(Clone)]
pub struct LiveClient {
    client: Client,
    base_url: String,
    /// Optional API key. If set, sent as `Authorization: Bearer {key}`.
    api_key: Option<String>,
    /// Optional organization ID. If set, sent as `OpenAI-Organization: {org}`.
    organization: Option<String>,
    default_model: String,
}

impl std::fmt::Debug for LiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|k| {
                match k.char_indices().nth(6) {
                    Some((cut, _)) => format!("{}***", &k[..cut]),
                    None => "***".to_string(),
                }
            }))
            .field("organization", &self.organization)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl LiveClient {
    /// Create a new builder.
    pub fn builder(base_url: impl Into<String>) -> LiveClientBuilder {
        LiveClientBuilder {
            client: None,
            base_url: base_url.into(),
            api_key: None,
            organization: None,
            default_model: None,
            timeout: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Returns `true` if an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Build the request body for `chat/completions`.
    fn build_body(prompt: &str, model: &str, temperature: f64) -> Value {
        json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": temperature,
        })
    }

    /// Attach auth headers, failing when no key is configured.
    fn authorize(&self, mut req: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let key = self.api_key.as_ref().ok_or(PipelineError::NotConfigured)?;
        req = req.bearer_auth(key);
        if let Some(ref org) = self.organization {
            req = req.header("OpenAI-Organization", org.as_str());
        }
        Ok(req)
    }

    /// Send a request and decode a JSON body, mapping non-2xx to [`BackendError::Http`].
    async fn send_json(&self, req: reqwest::RequestBuilder) -> Result<Value> {
        let resp = req.send().await.map_err(BackendError::Request)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        let bytes = resp.bytes().await.map_err(BackendError::Request)?;
        let value = serde_json::from_slice(&bytes).map_err(BackendError::Decode)?;
        Ok(value)
    }

    /// Pull `choices[0].message.content` out of a chat completion response.
    fn extract_content(json_resp: &Value) -> Option<&str> {
        json_resp
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
    }
}

#[async_trait]
impl CompletionClient for LiveClient {
    async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
        temperature: f64,
    ) -> Result<String> {
        let model = model.unwrap_or(&self.default_model);
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(prompt, model, temperature);
        let req = self.authorize(self.client.post(&url).json(&body))?;

        tracing::debug!(%url, model, temperature, "sending chat completion");
        let json_resp = self.send_json(req).await?;

        match Self::extract_content(&json_resp) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(BackendError::EmptyResponse.into()),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let req = self.authorize(self.client.get(&url))?;
        let json_resp = self.send_json(req).await?;

        let models = json_resp
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or(BackendError::EmptyResponse)?
            .iter()
            .filter_map(|m| m.get("id").and_then(|id| id.as_str()))
            .map(str::to_string)
            .collect();
        Ok(models)
    }

    fn is_configured(&self) -> bool {
        self.has_api_key()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Builder for [`LiveClient`].
pub struct LiveClientBuilder {
    client: Option<Client>,
    base_url: String,
    api_key: Option<String>,
    organization: Option<String>,
    default_model: Option<String>,
    timeout: Option<Duration>,
}

impl LiveClientBuilder {
    /// Set the HTTP client. If not set, one is built with the configured timeout.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set or clear the API key.
    pub fn api_key_opt(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// Set the organization ID header.
    pub fn organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Model used when a call passes `model: None`. Default: [`DEFAULT_MODEL`].
    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the request timeout. Default: 60 seconds.
    ///
    /// Ignored when a custom `Client` is provided via `.client()`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<LiveClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
                .build()?,
        };
        Ok(LiveClient {
            client,
            base_url: normalize_base_url(&self.base_url),
            api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            organization: self.organization,
            default_model: self
                .default_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Drop trailing slashes so endpoint paths join with exactly one `/`.
/// e.g., "https://api.openai.com/v1/" -> "https://api.openai.com/v1"
pub fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
