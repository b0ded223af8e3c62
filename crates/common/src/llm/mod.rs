//! LLM provider abstraction
//!
//! Every provider exposes one capability: turn a prompt into text within
//! a completion-token budget. Supported shapes:
//! - OpenAI chat completions (system + user message)
//! - OpenAI legacy completions (bare prompt, fixed engine)
//! - A scripted mock for tests

use crate::config::{ApiStyle, LlmConfig};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// System instruction sent with every chat-style request
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Trait for text completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete `prompt`, producing at most `max_tokens` tokens
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Shared HTTP plumbing for the OpenAI clients
struct OpenAiTransport {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    timeout_secs: u64,
}

impl OpenAiTransport {
    fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let api_key = self.api_key.as_deref().ok_or_else(|| AppError::Configuration {
            message: "LLM API key not configured (set OPENAI_API_KEY)".to_string(),
        })?;

        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Provider {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::Provider {
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::ProviderTimeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            AppError::Provider {
                message: format!("Request failed: {}", err),
            }
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// OpenAI chat completions client
pub struct OpenAiChat {
    transport: OpenAiTransport,
    model: String,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            transport: OpenAiTransport::new(config)?,
            model: config.model_name().to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
        };

        let response: ChatResponse = self.transport.post("chat/completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Provider {
                message: "Empty response from LLM".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

/// OpenAI legacy completions client
pub struct OpenAiCompletion {
    transport: OpenAiTransport,
    engine: String,
}

impl OpenAiCompletion {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            transport: OpenAiTransport::new(config)?,
            engine: config.model_name().to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompletion {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let request = CompletionRequest {
            model: &self.engine,
            prompt,
            max_tokens,
        };

        let response: CompletionResponse = self.transport.post("completions", &request).await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| AppError::Provider {
                message: "Empty response from LLM".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.engine
    }
}

/// Mock provider for testing
///
/// Replies with a fixed answer (or a fixed failure) and records every
/// prompt it receives.
pub struct MockLanguageModel {
    reply: std::result::Result<String, String>,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl MockLanguageModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, with their token budgets
    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), max_tokens));
        }

        self.reply.clone().map_err(|message| AppError::Provider { message })
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}

/// Create a provider based on configuration
pub fn create_language_model(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>> {
    if config.api_key.is_none() {
        tracing::warn!("No LLM API key configured, queries will fail until one is set");
    }

    let model: Arc<dyn LanguageModel> = match config.api_style {
        ApiStyle::Chat => Arc::new(OpenAiChat::new(config)?),
        ApiStyle::Completion => Arc::new(OpenAiCompletion::new(config)?),
    };

    tracing::info!(model = model.model_name(), style = ?config.api_style, "LLM provider ready");
    Ok(model)
}

/// Run a completion and record provider metrics around it
pub async fn complete_timed(
    model: &dyn LanguageModel,
    prompt: &str,
    max_tokens: u32,
) -> Result<String> {
    let start = Instant::now();
    let result = model.complete(prompt, max_tokens).await;

    crate::metrics::record_completion(
        start.elapsed().as_secs_f64(),
        model.model_name(),
        result.is_ok(),
    );

    result
}
