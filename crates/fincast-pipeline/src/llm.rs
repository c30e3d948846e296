//! OpenAI-compatible chat completion client (Groq by default).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use fincast_core::config::LlmSettings;
use fincast_core::traits::CompletionModel;

/// Sends each prompt as a single user message to `{base_url}/chat/completions`.
///
/// One attempt per call; retries, if any, belong to the caller.
#[derive(Clone)]
pub struct ChatCompletionClient {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ChatCompletionClient {
    pub fn new(base_url: &str, model: &str, api_key: &str, temperature: f32, max_tokens: u32, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            temperature,
            max_tokens,
        })
    }

    /// Builds the client from `[llm]` settings; the API key is required.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let api_key = settings
            .resolve_api_key()
            .ok_or_else(|| anyhow!("no API key: set llm.api_key, APP_LLM__API_KEY or GROQ_API_KEY"))?;
        Self::new(
            &settings.base_url,
            &settings.model,
            &api_key,
            settings.temperature,
            settings.max_tokens,
            Duration::from_secs(settings.timeout_secs),
        )
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", self.api_key))?);
        let req = ChatRequest {
            model: &self.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "chat completion request");
        let response = self.http.post(&url).headers(headers).json(&req).send().await.with_context(|| format!("request to {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error.message,
                Err(_) => "unknown error".to_string(),
            };
            bail!("chat completion failed ({}): {}", status, message);
        }
        let body: ChatResponse = response.json().await.context("malformed chat completion response")?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;
        Ok(content)
    }
}

/// Runs one completion under a deadline; expiry is reported as an error.
pub async fn complete_with_timeout(llm: &dyn CompletionModel, prompt: &str, timeout: Duration) -> Result<String> {
    match tokio::time::timeout(timeout, llm.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("completion from '{}' timed out after {:?}", llm.model_id(), timeout)),
    }
}
