//! Process-memory storage for sessions, messages and mood entries.
//!
//! `ChatStore` is the seam the HTTP layer talks to. `MemoryStore` keeps
//! everything in maps behind `tokio::sync::RwLock`; nothing survives a
//! restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{
    clamp_mood_score, new_id, ChatMessage, ChatSession, MoodEntry, MoodStats, NewChatMessage,
    NewChatSession, NewMoodEntry,
};

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_session(&self, new: NewChatSession) -> Result<ChatSession, StoreError>;

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, StoreError>;

    /// No-op when the session does not exist.
    async fn update_session_mood_score(&self, id: &str, average: f64) -> Result<(), StoreError>;

    /// Stamps `ended_at`. No-op when the session does not exist.
    async fn end_session(&self, id: &str) -> Result<(), StoreError>;

    async fn delete_session_and_messages(&self, id: &str) -> Result<(), StoreError>;

    async fn count_sessions(&self) -> Result<usize, StoreError>;

    /// Appends to the session transcript. Fails for an unknown session.
    async fn create_message(&self, new: NewChatMessage) -> Result<ChatMessage, StoreError>;

    /// Transcript in insertion order; empty for an unknown session.
    async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError>;

    /// Messages from every session owned by `user_id`, newest first.
    async fn get_user_chat_history(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    async fn create_mood_entry(&self, new: NewMoodEntry) -> Result<MoodEntry, StoreError>;

    /// Entries sorted by date ascending, optionally bounded (inclusive).
    async fn get_user_mood_entries(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<MoodEntry>, StoreError>;

    async fn get_user_mood_stats(&self, user_id: &str) -> Result<MoodStats, StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, ChatSession>>,
    messages: RwLock<HashMap<String, Vec<ChatMessage>>>,
    mood_entries: RwLock<HashMap<String, Vec<MoodEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_session(&self, new: NewChatSession) -> Result<ChatSession, StoreError> {
        let session = ChatSession {
            id: new_id("session"),
            user_id: new.user_id,
            started_at: Utc::now(),
            ended_at: None,
            average_mood_score: None,
        };
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        tracing::debug!(session_id = %session.id, "Created chat session");
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, StoreError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn update_session_mood_score(&self, id: &str, average: f64) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.average_mood_score = Some(average);
        }
        Ok(())
    }

    async fn end_session(&self, id: &str) -> Result<(), StoreError> {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.ended_at = Some(Utc::now());
            tracing::debug!(session_id = %id, "Ended chat session");
        }
        Ok(())
    }

    async fn delete_session_and_messages(&self, id: &str) -> Result<(), StoreError> {
        // Lock order is sessions then messages, matching create_message.
        let mut sessions = self.sessions.write().await;
        self.messages.write().await.remove(id);
        sessions.remove(id);
        Ok(())
    }

    async fn count_sessions(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.read().await.len())
    }

    async fn create_message(&self, new: NewChatMessage) -> Result<ChatMessage, StoreError> {
        // Held across the push: a message never outlives its session.
        let sessions = self.sessions.read().await;
        if !sessions.contains_key(&new.session_id) {
            return Err(StoreError::SessionNotFound(new.session_id));
        }

        let message = ChatMessage {
            id: new_id("msg"),
            mood_score: new.normalized_mood_score(),
            session_id: new.session_id,
            content: new.content,
            sender: new.sender,
            created_at: Utc::now(),
        };

        self.messages
            .write()
            .await
            .entry(message.session_id.clone())
            .or_default()
            .push(message.clone());
        drop(sessions);

        Ok(message)
    }

    async fn get_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self
            .messages
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_user_chat_history(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let owned: Vec<String> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .map(|s| s.id.clone())
            .collect();

        let messages = self.messages.read().await;
        let mut history: Vec<ChatMessage> = owned
            .iter()
            .filter_map(|id| messages.get(id))
            .flatten()
            .cloned()
            .collect();

        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        Ok(history)
    }

    async fn create_mood_entry(&self, new: NewMoodEntry) -> Result<MoodEntry, StoreError> {
        let entry = MoodEntry {
            id: new_id("mood"),
            user_id: new.user_id,
            date: new.date.unwrap_or_else(Utc::now),
            mood_score: clamp_mood_score(new.mood_score),
            session_id: new.session_id,
            notes: new.notes,
        };

        self.mood_entries
            .write()
            .await
            .entry(entry.user_id.clone())
            .or_default()
            .push(entry.clone());

        Ok(entry)
    }

    async fn get_user_mood_entries(
        &self,
        user_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<MoodEntry>, StoreError> {
        let mut entries: Vec<MoodEntry> = self
            .mood_entries
            .read()
            .await
            .get(user_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| start.map_or(true, |s| e.date >= s))
                    .filter(|e| end.map_or(true, |en| e.date <= en))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        entries.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(entries)
    }

    async fn get_user_mood_stats(&self, user_id: &str) -> Result<MoodStats, StoreError> {
        let scores: Vec<f64> = self
            .mood_entries
            .read()
            .await
            .get(user_id)
            .map(|entries| entries.iter().map(|e| e.mood_score).collect())
            .unwrap_or_default();
        Ok(MoodStats::from_scores(&scores))
    }
}
