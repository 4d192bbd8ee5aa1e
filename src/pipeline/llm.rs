//! Model invocation: advance a [`Transcript`] by one model turn.
//!
//! [`TranscriptGateway`] is the seam between the deterministic core and the
//! model. The core hands it a transcript and a model name and gets back a
//! *continuation*, the messages to append after the input. It never retries or
//! interprets failures; that is the gateway implementation's business.
//!
//! [`LlmGateway`] is the production implementation on top of `edgequake-llm`.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent under
//! concurrent load. Exponential backoff (`retry_backoff_ms * 2^attempt`)
//! avoids thundering-herd: with 500 ms base and 3 retries the wait sequence
//! is 500 ms → 1 s → 2 s. Each attempt is bounded by `api_timeout_secs`.

use crate::config::ServiceConfig;
use crate::error::Page2MdError;
use crate::pipeline::encode::parse_data_uri;
use crate::transcript::{Message, Role, Transcript};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Capability that extends a transcript with the model's reply.
#[async_trait]
pub trait TranscriptGateway: Send + Sync {
    /// Run `model` on `transcript` and return only the new messages.
    async fn extend_transcript(
        &self,
        model: &str,
        transcript: &Transcript,
    ) -> Result<Transcript, Page2MdError>;
}

/// Gateway backed by an `edgequake-llm` provider.
#[derive(Debug, Clone)]
pub struct LlmGateway {
    config: Arc<ServiceConfig>,
}

impl LlmGateway {
    pub fn new(config: Arc<ServiceConfig>) -> Self {
        Self { config }
    }

    /// Resolve the LLM provider, from most-specific to least-specific.
    ///
    /// 1. **Pre-built provider** (`config.provider`): used as-is; the model
    ///    name is ignored because the provider is already bound to one.
    /// 2. **Named provider** (`config.provider_name`) + requested model.
    /// 3. **`EDGEQUAKE_LLM_PROVIDER`** env var + requested model.
    /// 4. **`OPENAI_API_KEY`** present → OpenAI + requested model.
    /// 5. **Full auto-detection** (`ProviderFactory::from_env`).
    fn resolve_provider(&self, model: &str) -> Result<Arc<dyn LLMProvider>, Page2MdError> {
        if let Some(ref provider) = self.config.provider {
            return Ok(Arc::clone(provider));
        }

        if let Some(ref name) = self.config.provider_name {
            return create_vision_provider(name, model);
        }

        if let Ok(prov) = std::env::var("EDGEQUAKE_LLM_PROVIDER") {
            if !prov.is_empty() {
                return create_vision_provider(&prov, model);
            }
        }

        if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
            if !openai_key.is_empty() {
                return create_vision_provider("openai", model);
            }
        }

        let (llm_provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| Page2MdError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                    Error: {}",
                    e
                ),
            })?;

        Ok(llm_provider)
    }
}

#[async_trait]
impl TranscriptGateway for LlmGateway {
    async fn extend_transcript(
        &self,
        model: &str,
        transcript: &Transcript,
    ) -> Result<Transcript, Page2MdError> {
        let provider = self.resolve_provider(model)?;
        let messages = to_chat_messages(transcript);
        let options = build_options(&self.config);
        let max_retries = self.config.max_retries;
        let per_attempt = Duration::from_secs(self.config.api_timeout_secs);

        let start = Instant::now();
        let mut last_err: Option<String> = None;
        let mut every_attempt_timed_out = true;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let backoff = retry_backoff(self.config.retry_backoff_ms, attempt);
                warn!(
                    "Model {}: retry {}/{} after {}ms",
                    model, attempt, max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match timeout(per_attempt, provider.chat(&messages, Some(&options))).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Model {}: {} input tokens, {} output tokens, {:?}",
                        model,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(Transcript::empty().append(Message::assistant(response.content)));
                }
                Ok(Err(e)) => {
                    every_attempt_timed_out = false;
                    let err_msg = format!("{}", e);
                    warn!("Model {}: attempt {} failed: {}", model, attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
                Err(_) => {
                    warn!(
                        "Model {}: attempt {} timed out after {}s",
                        model,
                        attempt + 1,
                        self.config.api_timeout_secs
                    );
                    last_err = Some("timed out".to_string());
                }
            }
        }

        info!("Model {}: giving up after {:?}", model, start.elapsed());
        if every_attempt_timed_out {
            return Err(Page2MdError::ApiTimeout {
                secs: self.config.api_timeout_secs,
            });
        }
        Err(Page2MdError::LlmApiError {
            retries: max_retries,
            message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Page2MdError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Page2MdError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Build `CompletionOptions` from the service config.
/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`, saturating.
fn retry_backoff(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn build_options(config: &ServiceConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Map transcript messages onto provider chat messages.
///
/// Attachments become `ImageData`: data URIs are split into mime type and
/// base64 payload, anything else is forwarded as a URL. `detail: "high"` lets
/// GPT-4-class models tile the full image so fine print stays legible.
pub fn to_chat_messages(transcript: &Transcript) -> Vec<ChatMessage> {
    transcript
        .messages()
        .iter()
        .map(|message| {
            let text = message.content.flatten_text();
            match message.role {
                Role::System => ChatMessage::system(&text),
                Role::Assistant => ChatMessage::assistant(&text),
                Role::User => {
                    let images = message
                        .content
                        .image_sources()
                        .into_iter()
                        .map(image_data_from_source)
                        .collect();
                    ChatMessage::user_with_images(&text, images)
                }
            }
        })
        .collect()
}

/// Convert one attachment source into provider image data.
pub fn image_data_from_source(source: &str) -> ImageData {
    match parse_data_uri(source) {
        Some((mime, payload)) => ImageData::new(payload.to_string(), mime),
        None => ImageData::from_url(source),
    }
    .with_detail("high")
}
