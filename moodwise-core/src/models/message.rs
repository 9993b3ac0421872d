use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mood::clamp_mood_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    /// Role name used by OpenAI-compatible chat completion APIs.
    pub fn chat_role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub content: String,
    pub sender: Sender,
    pub mood_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub session_id: String,
    pub content: String,
    pub sender: Sender,
    pub mood_score: Option<f64>,
}

impl NewChatMessage {
    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            content: content.into(),
            sender: Sender::User,
            mood_score: None,
        }
    }

    pub fn ai(session_id: impl Into<String>, content: impl Into<String>, mood_score: f64) -> Self {
        Self {
            session_id: session_id.into(),
            content: content.into(),
            sender: Sender::Ai,
            mood_score: Some(mood_score),
        }
    }

    /// Score as it will be stored: clamped to 1..=10, NaN dropped.
    pub fn normalized_mood_score(&self) -> Option<f64> {
        self.mood_score
            .filter(|s| !s.is_nan())
            .map(clamp_mood_score)
    }
}
