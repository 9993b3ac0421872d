use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MOOD_SCORE_MIN: f64 = 1.0;
pub const MOOD_SCORE_MAX: f64 = 10.0;
pub const MOOD_SCORE_NEUTRAL: f64 = 5.0;

/// Clamp a mood score into `1..=10`. NaN maps to the neutral score.
pub fn clamp_mood_score(score: f64) -> f64 {
    if score.is_nan() {
        MOOD_SCORE_NEUTRAL
    } else {
        score.clamp(MOOD_SCORE_MIN, MOOD_SCORE_MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    VeryNegative,
    Negative,
    SlightlyNegative,
    #[default]
    Neutral,
    SlightlyPositive,
    Positive,
    VeryPositive,
}

impl Sentiment {
    /// Parse a model-provided label; anything unrecognised is neutral.
    pub fn parse_lossy(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "very_negative" => Sentiment::VeryNegative,
            "negative" => Sentiment::Negative,
            "slightly_negative" => Sentiment::SlightlyNegative,
            "slightly_positive" => Sentiment::SlightlyPositive,
            "positive" => Sentiment::Positive,
            "very_positive" => Sentiment::VeryPositive,
            _ => Sentiment::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::VeryNegative => "very_negative",
            Sentiment::Negative => "negative",
            Sentiment::SlightlyNegative => "slightly_negative",
            Sentiment::Neutral => "neutral",
            Sentiment::SlightlyPositive => "slightly_positive",
            Sentiment::Positive => "positive",
            Sentiment::VeryPositive => "very_positive",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one user message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodAnalysis {
    /// 1 (very negative) ..= 10 (very positive)
    pub score: f64,
    pub sentiment: Sentiment,
    /// 0..=1
    pub confidence: f64,
}

impl MoodAnalysis {
    /// Returned whenever the mood call fails.
    pub fn neutral_fallback() -> Self {
        Self {
            score: MOOD_SCORE_NEUTRAL,
            sentiment: Sentiment::Neutral,
            confidence: 0.1,
        }
    }

    pub fn summary(&self) -> String {
        format!("Mood: {}/10 ({})", self.score, self.sentiment)
    }
}

/// Reply text plus mood for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatAnalysis {
    pub response: String,
    pub mood: MoodAnalysis,
    pub summary: String,
}

impl ChatAnalysis {
    pub fn new(response: String, mood: MoodAnalysis) -> Self {
        let summary = mood.summary();
        Self {
            response,
            mood,
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub mood_score: f64,
    pub session_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub user_id: String,
    pub mood_score: f64,
    pub session_id: Option<String>,
    pub notes: Option<String>,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodStats {
    pub average_mood: f64,
    pub best_mood: f64,
    pub worst_mood: f64,
    pub total_entries: usize,
}

impl MoodStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let sum: f64 = scores.iter().sum();
        Self {
            average_mood: sum / scores.len() as f64,
            best_mood: scores.iter().copied().fold(f64::MIN, f64::max),
            worst_mood: scores.iter().copied().fold(f64::MAX, f64::min),
            total_entries: scores.len(),
        }
    }
}
