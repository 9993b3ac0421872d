use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::MoodwiseError;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MoodwiseConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub groq: GroqConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Settings for the Groq chat completions client.
///
/// `api_key` is normally left unset so the key comes from `GROQ_API_KEY`
/// (or `VITE_GROQ_API_KEY`) in the environment.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GroqConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub reply_max_tokens: u32,
    pub reply_temperature: f32,
    pub mood_max_tokens: u32,
    pub mood_temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            model: DEFAULT_GROQ_MODEL.to_string(),
            api_key: None,
            reply_max_tokens: 500,
            reply_temperature: 0.7,
            mood_max_tokens: 150,
            mood_temperature: 0.3,
            timeout_seconds: 30,
        }
    }
}

impl GroqConfig {
    /// Config value first, then `GROQ_API_KEY`, then `VITE_GROQ_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
            .or_else(|| std::env::var("VITE_GROQ_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of earlier messages sent to the model as conversation history.
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self { history_limit: 10 }
    }
}

impl MoodwiseConfig {
    /// Load from an optional TOML file, then apply `MOODWISE__SECTION__KEY`
    /// environment overrides.
    pub fn load(path: &str) -> Result<Self, MoodwiseError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("MOODWISE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MoodwiseError> {
        if self.groq.base_url.trim().is_empty() {
            return Err(MoodwiseError::InvalidConfig(
                "groq.base_url must not be empty".to_string(),
            ));
        }
        if self.groq.model.trim().is_empty() {
            return Err(MoodwiseError::InvalidConfig(
                "groq.model must not be empty".to_string(),
            ));
        }
        for (name, value) in [
            ("groq.reply_temperature", self.groq.reply_temperature),
            ("groq.mood_temperature", self.groq.mood_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(MoodwiseError::InvalidConfig(format!(
                    "{} must be within 0.0..=2.0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
