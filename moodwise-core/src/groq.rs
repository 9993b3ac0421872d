//! Groq chat completions client.
//!
//! Every user turn makes two calls against the OpenAI-compatible
//! `/chat/completions` endpoint: one for the companion's reply and one for a
//! JSON mood classification. `CompanionBackend::respond` runs both
//! concurrently and degrades each one to a neutral default on failure, so a
//! turn never errors because of the model provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GroqConfig;
use crate::models::{
    clamp_mood_score, ChatAnalysis, ChatMessage, MoodAnalysis, Sentiment, MOOD_SCORE_NEUTRAL,
};

pub const FALLBACK_REPLY: &str =
    "I'm here to listen. Could you tell me a bit more about how you're feeling?";

pub const EMPTY_REPLY: &str = "I'm having trouble responding right now. Could you try again?";

const COMPANION_PROMPT: &str = "You are MoodWise, a compassionate AI companion specialized in mood tracking and emotional wellness.
Your role is to:
1. Listen empathetically to users' feelings and experiences
2. Ask thoughtful follow-up questions to understand their emotional state
3. Provide gentle support and wellness tips when appropriate
4. Help users reflect on their emotions without being clinical or providing medical advice
5. Keep responses conversational, warm, and supportive

Always respond with empathy and understanding. Focus on emotional wellness and helping users process their feelings.";

const MOOD_PROMPT: &str = r#"You are an expert mood analyzer. Analyze the emotional content of the user's message and respond with a JSON object containing:
{
  "score": number (1-10 scale where 1 is very negative, 5 is neutral, 10 is very positive),
  "sentiment": string (one of: "very_negative", "negative", "slightly_negative", "neutral", "slightly_positive", "positive", "very_positive"),
  "confidence": number (0-1 scale indicating confidence in the analysis)
}

Consider factors like:
- Emotional words and phrases
- Context and implications
- Overall tone
- Stress indicators
- Positive or negative experiences mentioned

Only respond with the JSON object, no other text."#;

// ============================================================================
// CompanionBackend trait
// ============================================================================

#[async_trait]
pub trait CompanionBackend: Send + Sync {
    /// Free-text empathetic reply. `history` is the earlier conversation,
    /// oldest first.
    async fn generate_response(
        &self,
        message: &str,
        history: &[PromptMessage],
    ) -> Result<String, GroqError>;

    async fn analyze_mood(&self, message: &str) -> Result<MoodAnalysis, GroqError>;

    /// Reply and mood for one turn, requested concurrently. Never fails:
    /// each half falls back independently.
    async fn respond(&self, message: &str, history: &[PromptMessage]) -> ChatAnalysis {
        let (reply, mood) = futures::join!(
            self.generate_response(message, history),
            self.analyze_mood(message)
        );

        let response = reply.unwrap_or_else(|e| {
            tracing::warn!(backend = self.name(), error = %e, "Reply generation failed, using fallback reply");
            FALLBACK_REPLY.to_string()
        });
        let mood = mood.unwrap_or_else(|e| {
            tracing::warn!(backend = self.name(), error = %e, "Mood analysis failed, using neutral mood");
            MoodAnalysis::neutral_fallback()
        });

        ChatAnalysis::new(response, mood)
    }

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum GroqError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key: set GROQ_API_KEY")]
    MissingApiKey,

    #[error("Malformed mood analysis: {0}")]
    MalformedMood(String),
}

// ============================================================================
// Wire structs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.sender.chat_role().to_string(),
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<PromptMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: Option<GroqErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorDetail {
    message: String,
}

// ============================================================================
// GroqClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    config: GroqConfig,
    api_key: String,
}

impl GroqClient {
    pub fn new(config: GroqConfig) -> Result<Self, GroqError> {
        let api_key = config.resolve_api_key().ok_or(GroqError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Create a client with a custom base URL (for testing / self-hosted gateways)
    pub fn with_base_url(mut config: GroqConfig, base_url: String) -> Result<Self, GroqError> {
        config.base_url = base_url;
        Self::new(config)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// One chat completion. `Ok(None)` when the API returned no content.
    async fn complete(
        &self,
        messages: Vec<PromptMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Option<String>, GroqError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GroqErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Groq API error");

            return Err(GroqError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let completion: CompletionResponse = response.json().await?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty()))
    }
}

#[async_trait]
impl CompanionBackend for GroqClient {
    async fn generate_response(
        &self,
        message: &str,
        history: &[PromptMessage],
    ) -> Result<String, GroqError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(PromptMessage::system(COMPANION_PROMPT));
        messages.extend(history.iter().cloned());
        messages.push(PromptMessage::user(message));

        let reply = self
            .complete(
                messages,
                self.config.reply_max_tokens,
                self.config.reply_temperature,
            )
            .await?;

        Ok(reply.unwrap_or_else(|| EMPTY_REPLY.to_string()))
    }

    async fn analyze_mood(&self, message: &str) -> Result<MoodAnalysis, GroqError> {
        let messages = vec![PromptMessage::system(MOOD_PROMPT), PromptMessage::user(message)];

        let content = self
            .complete(
                messages,
                self.config.mood_max_tokens,
                self.config.mood_temperature,
            )
            .await?;

        parse_mood_analysis(content.as_deref().unwrap_or("{}"))
    }

    fn name(&self) -> &str {
        "groq"
    }
}

// ============================================================================
// Mood parsing
// ============================================================================

/// Parse the model's mood reply into a normalised `MoodAnalysis`.
///
/// The first JSON value starting at a `{` is read and anything after it is
/// ignored, so prose or a code fence around the object is fine. Missing or zero
/// fields take defaults (score 5, neutral, confidence 0.5); score is clamped
/// to 1..=10 and confidence to 0..=1.
pub fn parse_mood_analysis(content: &str) -> Result<MoodAnalysis, GroqError> {
    let start = content
        .find('{')
        .ok_or_else(|| GroqError::MalformedMood(format!("no JSON object in {:?}", content)))?;

    let value = serde_json::Deserializer::from_str(&content[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| GroqError::MalformedMood("empty mood reply".to_string()))?
        .map_err(|e| GroqError::MalformedMood(e.to_string()))?;

    if !value.is_object() {
        return Err(GroqError::MalformedMood("expected a JSON object".to_string()));
    }

    let score = value["score"]
        .as_f64()
        .filter(|s| *s != 0.0 && s.is_finite())
        .unwrap_or(MOOD_SCORE_NEUTRAL);

    let sentiment = value["sentiment"]
        .as_str()
        .map(Sentiment::parse_lossy)
        .unwrap_or_default();

    let confidence = value["confidence"]
        .as_f64()
        .filter(|c| *c != 0.0 && c.is_finite())
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);

    Ok(MoodAnalysis {
        score: clamp_mood_score(score),
        sentiment,
        confidence,
    })
}

// ============================================================================
// TESTS
// ============================================================================
