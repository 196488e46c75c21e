use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::time::Duration;

use crate::models::{AiProvider, HeadToHeadContext, Language, Match, Settings};
use crate::services::{generate_prompt, PredictionError};
use crate::utils::trim_trailing_slash;

const SYSTEM_PROMPT: &str = "You are a football score prediction expert. You always output JSON.";
const TEMPERATURE: f64 = 0.7;

// ── Provider selection ───────────────────────────────────────────────────────

/// Resolved provider with the credentials it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    Gemini { api_key: String },
    OpenAi { api_key: String },
    OpenRouter { api_key: String },
    /// Local or self-hosted server speaking the OpenAI chat-completions protocol.
    OpenAiCompatible { base_url: String, api_key: Option<String> },
}

impl ProviderConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, PredictionError> {
        let api_key = settings.ai_api_key.trim();
        let required_key = || {
            if api_key.is_empty() {
                Err(PredictionError::MissingKey)
            } else {
                Ok(api_key.to_string())
            }
        };

        match &settings.ai_provider {
            AiProvider::Gemini => Ok(ProviderConfig::Gemini { api_key: required_key()? }),
            AiProvider::OpenAi => Ok(ProviderConfig::OpenAi { api_key: required_key()? }),
            AiProvider::OpenRouter => Ok(ProviderConfig::OpenRouter { api_key: required_key()? }),
            AiProvider::OpenAiCompatible => {
                let base_url = settings.ai_base_url.trim();
                if base_url.is_empty() {
                    return Err(PredictionError::MissingBaseUrl);
                }
                Ok(ProviderConfig::OpenAiCompatible {
                    base_url: base_url.to_string(),
                    api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
                })
            }
            AiProvider::Unknown(name) => Err(PredictionError::UnknownProvider(name.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderConfig::Gemini { .. }           => "Gemini",
            ProviderConfig::OpenAi { .. }           => "OpenAI",
            ProviderConfig::OpenRouter { .. }       => "OpenRouter",
            ProviderConfig::OpenAiCompatible { .. } => "OpenAI Compatible",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderConfig::Gemini { .. }           => "gemini-pro",
            ProviderConfig::OpenAi { .. }           => "gpt-3.5-turbo",
            ProviderConfig::OpenRouter { .. }       => "anthropic/claude-3-haiku",
            ProviderConfig::OpenAiCompatible { .. } => "local-model",
        }
    }
}

// ── Endpoints ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub gemini_base: String,
    pub openai_base: String,
    pub openrouter_base: String,
    /// Sent to OpenRouter as `HTTP-Referer`.
    pub app_url: String,
    /// Sent to OpenRouter as `X-Title`.
    pub app_title: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            gemini_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            openai_base: "https://api.openai.com/v1".to_string(),
            openrouter_base: "https://openrouter.ai/api/v1".to_string(),
            app_url: "https://github.com/score-predictor".to_string(),
            app_title: "Football Predictor".to_string(),
        }
    }
}

impl ProviderEndpoints {
    pub fn from_env() -> Self {
        let mut endpoints = Self::default();
        if let Ok(referer) = env::var("OPENROUTER_REFERER") {
            if !referer.trim().is_empty() {
                endpoints.app_url = referer;
            }
        }
        endpoints
    }
}

// ── Wire formats ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

// ── ProviderClient ───────────────────────────────────────────────────────────

/// Sends one prompt to one AI backend and returns the unparsed reply text.
/// Single attempt, no retry.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    endpoints: ProviderEndpoints,
    timeout: Option<Duration>,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new(ProviderEndpoints::default())
    }
}

impl ProviderClient {
    pub fn new(endpoints: ProviderEndpoints) -> Self {
        Self {
            client: Client::new(),
            endpoints,
            timeout: None,
        }
    }

    /// Endpoints plus the optional `AI_REQUEST_TIMEOUT_SECS` limit.
    pub fn from_env() -> Self {
        let client = Self::new(ProviderEndpoints::from_env());
        match env::var("AI_REQUEST_TIMEOUT_SECS").ok().and_then(|s| s.trim().parse::<u64>().ok()) {
            Some(secs) if secs > 0 => client.with_timeout(Duration::from_secs(secs)),
            _ => client,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the prompt for `m` and ask the configured provider for a prediction.
    pub async fn predict(
        &self,
        config: &ProviderConfig,
        m: &Match,
        context: Option<&HeadToHeadContext>,
        language: Language,
        model: Option<&str>,
    ) -> Result<String, PredictionError> {
        let prompt = generate_prompt(m, context, language);
        self.complete(config, &prompt, model).await
    }

    pub async fn complete(
        &self,
        config: &ProviderConfig,
        prompt: &str,
        model: Option<&str>,
    ) -> Result<String, PredictionError> {
        let model = model.unwrap_or_else(|| config.default_model());
        tracing::info!("Requesting prediction from {} (model {})", config.name(), model);

        match config {
            ProviderConfig::Gemini { api_key } => self.gemini(api_key, model, prompt).await,
            ProviderConfig::OpenAi { api_key } => {
                let url = format!("{}/chat/completions", self.endpoints.openai_base);
                self.chat_completion(config.name(), &url, Some(api_key.as_str()), &[], model, prompt).await
            }
            ProviderConfig::OpenRouter { api_key } => {
                let url = format!("{}/chat/completions", self.endpoints.openrouter_base);
                let headers = [
                    ("HTTP-Referer", self.endpoints.app_url.as_str()),
                    ("X-Title", self.endpoints.app_title.as_str()),
                ];
                self.chat_completion(config.name(), &url, Some(api_key.as_str()), &headers, model, prompt).await
            }
            ProviderConfig::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{}/chat/completions", trim_trailing_slash(base_url));
                self.chat_completion(config.name(), &url, api_key.as_deref(), &[], model, prompt).await
            }
        }
    }

    fn with_limits(&self, request: RequestBuilder) -> RequestBuilder {
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    async fn gemini(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, PredictionError> {
        let url = format!("{}/models/{}:generateContent", self.endpoints.gemini_base, model);
        let body = GeminiRequest {
            contents: vec![GeminiContent { parts: vec![GeminiPart { text: prompt }] }],
        };

        let response = self
            .with_limits(self.client.post(&url).query(&[("key", api_key)]).json(&body))
            .send()
            .await?;

        // Gemini reports most failures in the body, so the status is only
        // consulted when that body is not JSON.
        let status = response.status();
        let text = response.text().await?;
        let data: Value = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(_) if !status.is_success() => {
                return Err(http_error("Gemini", status, non_empty(text)));
            }
            Err(e) => return Err(PredictionError::Malformed(e.to_string())),
        };

        let Some(candidate) = data.get("candidates").and_then(Value::as_array).and_then(|c| c.first()) else {
            tracing::warn!("Gemini returned no candidates");
            return Err(PredictionError::EmptyResponse(data.to_string()));
        };

        candidate
            .pointer("/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PredictionError::Malformed("Gemini candidate has no text part".to_string()))
    }

    async fn chat_completion(
        &self,
        provider: &'static str,
        url: &str,
        api_key: Option<&str>,
        headers: &[(&str, &str)],
        model: &str,
        prompt: &str,
    ) -> Result<String, PredictionError> {
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: TEMPERATURE,
        };

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = self.with_limits(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message);
            return Err(http_error(provider, status, message));
        }

        let text = response.text().await?;
        let data: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| PredictionError::Malformed(format!("{} response: {}", provider, e)))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PredictionError::Malformed(format!("{} response has no message content", provider)))
    }
}

fn http_error(provider: &'static str, status: StatusCode, message: Option<String>) -> PredictionError {
    PredictionError::Http {
        provider,
        status: status.as_u16(),
        message: message
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string()),
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
