//! OpenAI-compatible chat-completions client for quote generation.
//!
//! [`QuoteGenerator::request_quote`] returns an explicit
//! [`GenerationOutcome`]; [`QuoteGenerator::generate`] substitutes a fallback
//! quote for every failure so callers always receive usable text.

use crate::config::GeneratorConfig;
use crate::generator::QuoteSource;
use crate::generator::picker::Picker;
use crate::generator::prompts::{FALLBACK_QUOTES, SYSTEM_PROMPT, USER_PROMPTS};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Used if the fallback pool is ever empty.
const LAST_RESORT_QUOTE: &str =
    "Try a sunset picnic with your favorite foods and a great view - simple but memorable.";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Chat-completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model ID to use for completion.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// The role of the message author (`system`, `user`, `assistant`).
    pub role: String,
    /// The content of the message.
    pub content: String,
}

/// The subset of a chat-completions response the generator reads.
#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a provider call produced no quote.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Connection or transport failure.
    #[error("request failed: {0}")]
    Request(String),
    /// No response within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },
    /// Body did not contain generated text at `choices[0].message.content`.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result of one provider call.
pub type GenerationOutcome = Result<String, GenerationError>;

// ---------------------------------------------------------------------------
// QuoteGenerator
// ---------------------------------------------------------------------------

/// Quote source backed by a chat-completions endpoint.
pub struct QuoteGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
    prompts: Picker,
    fallbacks: Picker,
}

impl std::fmt::Debug for QuoteGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteGenerator")
            .field("endpoint", &self.config.endpoint)
            .field("model", &self.config.model)
            .field("prompt_variety", &self.prompts.variety())
            .field("fallback_variety", &self.fallbacks.variety())
            .finish()
    }
}

impl QuoteGenerator {
    /// Create a generator with entropy-seeded pickers.
    pub fn new(config: GeneratorConfig) -> Self {
        let prompts = Picker::new(config.prompt_variety);
        let fallbacks = Picker::new(config.fallback_variety);
        Self::with_pickers(config, prompts, fallbacks)
    }

    /// Create a generator with explicit pickers (seeded in tests).
    pub fn with_pickers(config: GeneratorConfig, prompts: Picker, fallbacks: Picker) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("cannot build HTTP client with timeout, using defaults: {e}");
                reqwest::Client::new()
            });
        Self {
            config,
            client,
            prompts,
            fallbacks,
        }
    }

    /// Build the request body, selecting the user prompt.
    pub fn build_request(&self) -> ChatCompletionRequest {
        let user_prompt = self.prompts.pick(USER_PROMPTS).unwrap_or_default();
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: SYSTEM_PROMPT.to_owned(),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: user_prompt.to_owned(),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Call the provider once.
    pub async fn request_quote(&self) -> GenerationOutcome {
        let body = self.build_request();
        let timeout = self.config.timeout();

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_transport_error(&e, timeout))?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: extract_error_message(&text),
            });
        }

        extract_quote(&text)
    }

    /// A fallback quote from the configured pool.
    pub fn fallback(&self) -> &'static str {
        self.fallbacks
            .pick(FALLBACK_QUOTES)
            .unwrap_or(LAST_RESORT_QUOTE)
    }
}

#[async_trait]
impl QuoteSource for QuoteGenerator {
    async fn generate(&self) -> String {
        let started = Instant::now();
        match self.request_quote().await {
            Ok(quote) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "quote generated"
                );
                quote
            }
            Err(e) => {
                let fallback = self.fallback();
                warn!(error = %e, "quote generation failed, using fallback");
                fallback.to_owned()
            }
        }
    }
}

fn map_transport_error(e: &reqwest::Error, timeout: Duration) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Timeout(timeout)
    } else {
        GenerationError::Request(e.to_string())
    }
}

/// Pull trimmed text from `choices[0].message.content`.
fn extract_quote(body: &str) -> GenerationOutcome {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse("no choices".to_owned()))?
        .message
        .content
        .ok_or_else(|| GenerationError::MalformedResponse("missing message content".to_owned()))?;

    let quote = content.trim();
    if quote.is_empty() {
        return Err(GenerationError::MalformedResponse(
            "empty message content".to_owned(),
        ));
    }
    Ok(quote.to_owned())
}

/// Extract an error message from an OpenAI-style error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}
