//! moodwise-cli: terminal client for the MoodWise chat API
//!
//! Talks to `moodwise-server` over HTTP and keeps the same running session
//! statistics the web view shows: message count, current mood score,
//! sentiment label and session duration.
//!
//! # Subcommands
//! - `chat`        — interactive conversation (`/quit` or EOF ends the session)
//! - `show <id>`   — print a session transcript and its statistics
//! - `end <id>`    — end a session
//! - `status`      — show server health

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
const WELCOME: &str = "Hello! I'm MoodWise, your AI companion for mood tracking and emotional wellness. How are you feeling today? Feel free to share what's on your mind.";
const MOOD_ALERT_THRESHOLD: f64 = 4.0;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "moodwise-cli", version, about = "Chat with MoodWise from the terminal")]
struct Cli {
    /// MoodWise HTTP server URL (overrides MOODWISE_HTTP_URL env var)
    #[arg(long, env = "MOODWISE_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start a new session and chat interactively
    Chat,

    /// Print a session transcript and statistics
    Show {
        /// Session identifier
        id: String,
    },

    /// End a session
    End {
        /// Session identifier
        id: String,
    },

    /// Show MoodWise server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub average_mood_score: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMessage {
    pub content: String,
    pub sender: String,
    pub mood_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SessionView {
    pub session: ApiSession,
    pub messages: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ApiMoodAnalysis {
    pub score: f64,
    pub sentiment: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub ai_message: Option<ApiMessage>,
    pub mood_analysis: Option<ApiMoodAnalysis>,
}

// ============================================================================
// Session statistics
// ============================================================================

/// Stats shown beside the conversation, updated after every turn.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub message_count: usize,
    pub current_mood_score: f64,
    pub sentiment: String,
    pub started_at: DateTime<Utc>,
}

impl SessionStats {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            message_count: 0,
            current_mood_score: 5.0,
            sentiment: "Neutral".to_string(),
            started_at,
        }
    }

    pub fn apply(&mut self, mood: &ApiMoodAnalysis) {
        self.current_mood_score = mood.score;
        self.sentiment = sentiment_label(&mood.sentiment).to_string();
        self.message_count += 1;
    }

    pub fn duration(&self, now: DateTime<Utc>) -> String {
        format_duration(self.started_at, now)
    }
}

/// Display label for a wire sentiment; unknown values read as neutral.
pub fn sentiment_label(sentiment: &str) -> &'static str {
    match sentiment {
        "very_positive" => "Very Happy",
        "positive" => "Happy",
        "slightly_positive" => "Good",
        "slightly_negative" => "Concerned",
        "negative" => "Worried",
        "very_negative" => "Distressed",
        _ => "Neutral",
    }
}

/// Whole minutes since `start`, e.g. `"12 min"`.
pub fn format_duration(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - start).num_minutes().max(0);
    format!("{} min", minutes)
}

/// Band used to colour a score: 8+ great, 6+ good, 4+ fair, else low.
pub fn mood_band(score: f64) -> &'static str {
    if score >= 8.0 {
        "great"
    } else if score >= 6.0 {
        "good"
    } else if score >= 4.0 {
        "fair"
    } else {
        "low"
    }
}

pub fn mood_alert(score: f64) -> Option<String> {
    (score < MOOD_ALERT_THRESHOLD).then(|| {
        format!(
            "Mood alert: detected lower mood ({:.1}/10). Take care of yourself!",
            score
        )
    })
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()?)
}

fn read_error(resp: reqwest::blocking::Response) -> String {
    let status = resp.status();
    let body: serde_json::Value = resp.json().unwrap_or_default();
    format!(
        "server returned {}: {}",
        status,
        body["message"].as_str().unwrap_or("unknown error")
    )
}

fn create_session(http: &reqwest::blocking::Client, server: &str) -> anyhow::Result<ApiSession> {
    let resp = http.post(format!("{}/api/chat/session", server)).send()?;
    if !resp.status().is_success() {
        anyhow::bail!(read_error(resp));
    }
    Ok(resp.json()?)
}

fn end_session(http: &reqwest::blocking::Client, server: &str, id: &str) -> anyhow::Result<()> {
    let resp = http
        .delete(format!("{}/api/chat/session/{}", server, id))
        .send()?;
    if !resp.status().is_success() {
        anyhow::bail!(read_error(resp));
    }
    Ok(())
}

fn do_chat(server: &str) -> anyhow::Result<()> {
    // Turns wait on two model calls, so allow more than the server's own timeout.
    let http = client(90)?;
    let session = create_session(&http, server)?;
    let mut stats = SessionStats::new(session.started_at);

    println!("MoodWise: {}\n", WELCOME);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let content = line.trim();
        if content.is_empty() {
            continue;
        }
        if content == "/quit" || content == "/exit" {
            break;
        }

        let resp = http
            .post(format!("{}/api/chat/message", server))
            .json(&serde_json::json!({ "sessionId": session.id, "content": content }))
            .send();

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                eprintln!("moodwise-cli: failed to send message ({})", read_error(r));
                continue;
            }
            Err(e) => {
                eprintln!("moodwise-cli: failed to send message: {}", e);
                continue;
            }
        };

        let turn: TurnResponse = resp.json()?;
        let reply = turn
            .ai_message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("I'm here to help. Could you share more about how you're feeling?");
        println!("\nMoodWise: {}\n", reply);

        if let Some(mood) = &turn.mood_analysis {
            stats.apply(mood);
            println!(
                "  [{} | mood {:.1}/10 ({}) | {} | {} messages]",
                mood.summary,
                stats.current_mood_score,
                stats.sentiment,
                stats.duration(Utc::now()),
                stats.message_count
            );
            if let Some(alert) = mood_alert(mood.score) {
                println!("  {}", alert);
            }
            println!();
        }
    }

    end_session(&http, server, &session.id)?;
    println!(
        "Session {} ended after {} ({} messages, last mood {:.1}/10, {}).",
        session.id,
        stats.duration(Utc::now()),
        stats.message_count,
        stats.current_mood_score,
        stats.sentiment
    );
    Ok(())
}

fn do_show(server: &str, id: &str) -> anyhow::Result<()> {
    let http = client(10)?;
    let resp = http
        .get(format!("{}/api/chat/session/{}", server, id))
        .send()?;
    if !resp.status().is_success() {
        anyhow::bail!(read_error(resp));
    }
    let view: SessionView = resp.json()?;

    for m in &view.messages {
        let who = if m.sender == "ai" { "MoodWise" } else { "you" };
        match m.mood_score {
            Some(score) => println!(
                "[{}] {}: {} (mood {:.1}/10)",
                m.created_at.format("%H:%M"),
                who,
                m.content,
                score
            ),
            None => println!("[{}] {}: {}", m.created_at.format("%H:%M"), who, m.content),
        }
    }
    println!();

    let end = view.session.ended_at.unwrap_or_else(Utc::now);
    let turns = view.messages.iter().filter(|m| m.sender == "user").count();
    let current = view
        .messages
        .iter()
        .rev()
        .find_map(|m| m.mood_score)
        .unwrap_or(5.0);

    println!("Session:  {}", view.session.id);
    println!(
        "Status:   {}",
        if view.session.ended_at.is_some() { "ended" } else { "active" }
    );
    println!("Duration: {}", format_duration(view.session.started_at, end));
    println!("Messages: {}", turns);
    println!("Current:  {:.1}/10 ({})", current, mood_band(current));
    match view.session.average_mood_score {
        Some(avg) => println!("Average:  {:.1}/10 ({})", avg, mood_band(avg)),
        None => println!("Average:  n/a"),
    }
    Ok(())
}

fn do_end(server: &str, id: &str) -> anyhow::Result<()> {
    let http = client(10)?;
    end_session(&http, server, id)?;
    println!("Session {} ended", id);
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let http = client(10)?;
    let url = format!("{}/health", server);

    match http.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("MoodWise server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:         {}", body["version"].as_str().unwrap_or("?"));
            println!("Sessions:        {}", body["sessions"].as_u64().unwrap_or(0));
        }
        Ok(r) => {
            eprintln!("moodwise-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("moodwise-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Chat => do_chat(&server),
        Commands::Show { id } => do_show(&server, &id),
        Commands::End { id } => do_end(&server, &id),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("moodwise-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
