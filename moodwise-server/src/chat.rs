//! One chat turn: store the user message, ask the companion for a reply and a
//! mood, store the reply, refresh the session's running mood average.

use moodwise_core::{
    ChatMessage, ChatStore, CompanionBackend, MoodwiseError, NewChatMessage, PromptMessage,
    Sentiment, StoreError,
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
    pub mood_analysis: MoodSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoodSummary {
    pub score: f64,
    pub sentiment: Sentiment,
    pub summary: String,
}

/// Mean of every numeric mood score in the transcript.
pub fn average_mood(messages: &[ChatMessage]) -> Option<f64> {
    let scores: Vec<f64> = messages.iter().filter_map(|m| m.mood_score).collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

pub async fn process_turn(
    store: &dyn ChatStore,
    companion: &dyn CompanionBackend,
    session_id: &str,
    content: &str,
    history_limit: usize,
) -> Result<TurnOutcome, MoodwiseError> {
    if store.get_session(session_id).await?.is_none() {
        return Err(StoreError::SessionNotFound(session_id.to_string()).into());
    }

    let content = content.trim();

    let earlier = store.get_messages(session_id).await?;
    let history: Vec<PromptMessage> = earlier
        .iter()
        .skip(earlier.len().saturating_sub(history_limit))
        .map(PromptMessage::from)
        .collect();

    let user_message = store
        .create_message(NewChatMessage::user(session_id, content))
        .await?;

    let analysis = companion.respond(content, &history).await;

    let ai_message = store
        .create_message(NewChatMessage::ai(
            session_id,
            analysis.response,
            analysis.mood.score,
        ))
        .await?;

    let transcript = store.get_messages(session_id).await?;
    if let Some(average) = average_mood(&transcript) {
        store.update_session_mood_score(session_id, average).await?;
    }

    tracing::info!(
        session_id = %session_id,
        backend = companion.name(),
        mood = analysis.mood.score,
        sentiment = %analysis.mood.sentiment,
        "Processed chat turn"
    );

    Ok(TurnOutcome {
        user_message,
        ai_message,
        mood_analysis: MoodSummary {
            score: analysis.mood.score,
            sentiment: analysis.mood.sentiment,
            summary: analysis.summary,
        },
    })
}
