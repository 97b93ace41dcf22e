//! HTTP gateway for the chat completions API

use super::types::{self, ChatResponse};
use crate::config::FileOpenAiConfig;
use async_trait::async_trait;
use casegen_application::{GatewayError, LlmGateway};
use casegen_domain::{CompletionRequest, LlmResponse};
use std::time::Duration;
use tracing::debug;

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAiConfig {
    api_key: String,
    base_url: String,
    max_tokens: u32,
    timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".to_string(),
            max_tokens: 4096,
            timeout: Duration::from_secs(180),
        }
    }

    /// Build from the `[providers.openai]` section. Fails when no API key
    /// is configured.
    pub fn from_file(file: &FileOpenAiConfig) -> Result<Self, GatewayError> {
        let api_key = file.resolve_api_key().ok_or_else(|| {
            GatewayError::ConnectionError(format!(
                "no API key: set {} or providers.openai.api_key",
                file.api_key_env
            ))
        })?;
        Ok(Self::new(api_key)
            .with_base_url(&file.base_url)
            .with_max_tokens(file.max_tokens)
            .with_timeout(Duration::from_secs(file.timeout_secs)))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full completions URL. Accepts base URLs with or without `/v1`.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }
}

fn mask_api_key(key: &str) -> String {
    if key.len() <= 12 {
        return "****".to_string();
    }
    format!("{}...{}", &key[..4], &key[key.len() - 4..])
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`LlmGateway`] over an OpenAI-compatible HTTP endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiGateway {
    pub fn new(config: OpenAiConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::ConnectionError(err.to_string())
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse, GatewayError> {
        let body = types::build_request(request, self.config.max_tokens);
        debug!(
            model = %request.model,
            messages = body.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(types::status_error(
                status.as_u16(),
                &text,
                request.model.as_str(),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        let converted = types::convert_response(parsed)?;
        debug!(
            model = %request.model,
            stop_reason = ?converted.stop_reason,
            tool_calls = converted.tool_calls().len(),
            "Chat completion received"
        );
        Ok(converted)
    }
}
