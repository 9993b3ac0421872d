pub mod config;
pub mod error;
pub mod groq;
pub mod models;
pub mod store;

pub use crate::config::MoodwiseConfig;
pub use error::{MoodwiseError, StoreError};
pub use groq::{CompanionBackend, GroqClient, GroqError, PromptMessage};
pub use models::{
    ChatAnalysis, ChatMessage, ChatSession, MoodAnalysis, MoodEntry, MoodStats, NewChatMessage,
    NewChatSession, NewMoodEntry, Sender, Sentiment,
};
pub use store::{ChatStore, MemoryStore};
