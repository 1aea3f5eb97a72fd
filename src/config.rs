//! Backend configuration and the startup-time client selection.
//!
//! Configuration comes from the environment:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `OPENAI_API_KEY` | credential; enables the live client | - |
//! | `OPENAI_BASE_URL` | alternate OpenAI-compatible API root | `https://api.openai.com/v1` |
//! | `OPENAI_MODEL` | model used when a stage does not name one | `gpt-4o-mini` |
//!
//! The binary also loads a `.env` file into the environment before reading
//! these. How a missing key is handled depends on the [`BackendMode`].

use crate::backend::openai::DEFAULT_BASE_URL;
use crate::backend::stub::DEFAULT_STUB_DELAY;
use crate::backend::{CompletionClient, LiveClient, StubClient, DEFAULT_MODEL};
use crate::error::{PipelineError, Result};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";

/// Which completion client to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// Live client when a key is present, stub otherwise.
    #[default]
    Auto,
    /// Always the stub.
    Stub,
    /// Always the live client; calls fail with `NotConfigured` without a key.
    Live,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Auto => "auto",
            BackendMode::Stub => "stub",
            BackendMode::Live => "live",
        }
    }
}

impl FromStr for BackendMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendMode::Auto),
            "stub" | "mock" => Ok(BackendMode::Stub),
            "live" => Ok(BackendMode::Live),
            other => Err(PipelineError::InvalidConfig(format!(
                "unknown backend mode '{}', expected auto, stub, or live",
                other
            ))),
        }
    }
}

/// Everything needed to build a completion client.
#[derive(Clone)]
pub struct BackendConfig {
    pub mode: BackendMode,
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_model: String,
    pub stub_delay: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("mode", &self.mode)
            .field("has_api_key", &self.api_key.is_some())
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("stub_delay", &self.stub_delay)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Auto,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            stub_delay: DEFAULT_STUB_DELAY,
        }
    }
}

impl BackendConfig {
    /// Read the `OPENAI_*` variables from the process environment.
    pub fn from_env(mode: BackendMode) -> Self {
        Self::from_lookup(mode, |key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(mode: BackendMode, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            mode,
            api_key: get(API_KEY_VAR),
            base_url: get(BASE_URL_VAR).unwrap_or(defaults.base_url),
            default_model: get(MODEL_VAR).unwrap_or(defaults.default_model),
            stub_delay: defaults.stub_delay,
        }
    }

    pub fn with_stub_delay(mut self, delay: Duration) -> Self {
        self.stub_delay = delay;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// The variant `build_client` will install.
    pub fn resolved_mode(&self) -> BackendMode {
        match self.mode {
            BackendMode::Auto if self.has_credential() => BackendMode::Live,
            BackendMode::Auto => BackendMode::Stub,
            explicit => explicit,
        }
    }

    /// Fail fast with `NotConfigured` when the live client would be used
    /// without a key.
    pub fn require_configured(&self) -> Result<()> {
        if self.resolved_mode() == BackendMode::Live && !self.has_credential() {
            return Err(PipelineError::NotConfigured);
        }
        Ok(())
    }

    /// Build the client once at startup.
    pub fn build_client(&self) -> Result<Arc<dyn CompletionClient>> {
        let client: Arc<dyn CompletionClient> = match self.resolved_mode() {
            BackendMode::Stub => Arc::new(StubClient::new().with_delay(self.stub_delay)),
            _ => Arc::new(
                LiveClient::builder(&self.base_url)
                    .api_key_opt(self.api_key.clone())
                    .default_model(&self.default_model)
                    .build()?,
            ),
        };
        tracing::info!(
            mode = self.mode.as_str(),
            backend = client.name(),
            configured = client.is_configured(),
            "completion client selected"
        );
        Ok(client)
    }
}
