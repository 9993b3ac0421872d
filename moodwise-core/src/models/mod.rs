mod message;
mod mood;
mod session;

pub use message::{ChatMessage, NewChatMessage, Sender};
pub use mood::{
    clamp_mood_score, ChatAnalysis, MoodAnalysis, MoodEntry, MoodStats, NewMoodEntry, Sentiment,
    MOOD_SCORE_MAX, MOOD_SCORE_MIN, MOOD_SCORE_NEUTRAL,
};
pub use session::{ChatSession, NewChatSession};

use chrono::Utc;
use uuid::Uuid;

/// `<prefix>_<unix millis>_<9 lowercase alphanumerics>`
pub fn new_id(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}
