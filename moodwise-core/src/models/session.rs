use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub user_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub average_mood_score: Option<f64>,
}

impl ChatSession {
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewChatSession {
    pub user_id: Option<String>,
}

impl NewChatSession {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}
