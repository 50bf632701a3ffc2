use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use vidgen_core::{enhance_prompt, EnhanceOptions, Enhancement};
use vidgen_logging::{vg_info, vg_warn};

use crate::client::map_reqwest_error;
use crate::{BackendError, FailureKind};

#[async_trait::async_trait]
pub trait PromptEnhancer: Send + Sync {
    async fn enhance(
        &self,
        prompt: &str,
        options: &EnhanceOptions,
    ) -> Result<Enhancement, BackendError>;
}

/// Offline keyword rules; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedEnhancer;

#[async_trait::async_trait]
impl PromptEnhancer for RuleBasedEnhancer {
    async fn enhance(
        &self,
        prompt: &str,
        options: &EnhanceOptions,
    ) -> Result<Enhancement, BackendError> {
        Ok(enhance_prompt(prompt, options))
    }
}

#[derive(Debug, Clone)]
pub struct CompletionSettings {
    /// Full URL of an OpenAI-compatible chat completions endpoint.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl CompletionSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: api_key.into(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 300,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Rewrites prompts through a hosted chat completion model.
#[derive(Debug, Clone)]
pub struct CompletionEnhancer {
    settings: CompletionSettings,
    client: reqwest::Client,
}

impl CompletionEnhancer {
    pub fn new(settings: CompletionSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
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
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

#[async_trait::async_trait]
impl PromptEnhancer for CompletionEnhancer {
    async fn enhance(
        &self,
        prompt: &str,
        options: &EnhanceOptions,
    ) -> Result<Enhancement, BackendError> {
        let system = system_prompt(options);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };
        let body = serde_json::to_vec(&request)
            .map_err(|err| BackendError::new(FailureKind::InvalidResponse, err.to_string()))?;

        vg_info!("Requesting prompt enhancement from {}", self.settings.model);
        let response = self
            .client
            .post(self.settings.endpoint.as_str())
            .bearer_auth(&self.settings.api_key)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("OpenAI API error: {}", text.trim()),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|err| BackendError::new(FailureKind::InvalidResponse, err.to_string()))?;
        let enhanced = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                BackendError::new(FailureKind::InvalidResponse, "completion had no content")
            })?;

        Ok(Enhancement {
            notes: vec![
                format!("Original prompt: \"{prompt}\""),
                format!("Enhanced with {}", self.settings.model),
                format!("Enhanced devotional prompt: \"{enhanced}\""),
            ],
            prompt: enhanced,
        })
    }
}

fn system_prompt(options: &EnhanceOptions) -> String {
    format!(
        "You are a specialist in creating detailed, accurate, and spiritually appropriate \
         video generation prompts. Enhance the user's prompt for a high-quality devotional video.\n\
         \n\
         USER SPECIFICATIONS:\n\
         - Religious Tradition: {}\n\
         - Devotional Category: {}\n\
         - Spiritual Theme: {}\n\
         - Visual Style: {}\n\
         \n\
         ENHANCEMENT GUIDELINES:\n\
         1. Preserve the core imagery and intention of the original prompt\n\
         2. Add religious symbolism and imagery relevant to the specified tradition\n\
         3. Incorporate visual elements that evoke the specified spiritual theme\n\
         4. Add details about lighting, atmosphere and camera movement\n\
         5. Keep the language respectful and appropriate for religious content\n\
         6. Avoid direct representation of deities or prophets where this would be \
         culturally inappropriate\n\
         \n\
         Return ONLY the enhanced prompt text with no additional commentary.",
        options.tradition, options.category, options.theme, options.style
    )
}

/// Tries `primary` and falls back to the rule-based enhancer on any error.
pub struct FallbackEnhancer {
    primary: Box<dyn PromptEnhancer>,
}

impl FallbackEnhancer {
    pub fn new(primary: Box<dyn PromptEnhancer>) -> Self {
        Self { primary }
    }

    /// Like [`PromptEnhancer::enhance`] but infallible.
    pub async fn enhance_or_fallback(
        &self,
        prompt: &str,
        options: &EnhanceOptions,
    ) -> Enhancement {
        match self.primary.enhance(prompt, options).await {
            Ok(enhancement) => enhancement,
            Err(error) => {
                vg_warn!("Prompt enhancement failed ({}): {error}", error.kind);
                let mut fallback = enhance_prompt(prompt, options);
                fallback.notes.push(format!(
                    "Advanced enhancement unavailable ({}); used rule-based enhancement",
                    error.kind
                ));
                fallback
            }
        }
    }
}

#[async_trait::async_trait]
impl PromptEnhancer for FallbackEnhancer {
    async fn enhance(
        &self,
        prompt: &str,
        options: &EnhanceOptions,
    ) -> Result<Enhancement, BackendError> {
        Ok(self.enhance_or_fallback(prompt, options).await)
    }
}
