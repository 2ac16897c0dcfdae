//! AI assistant collaborator.
//!
//! Backends implement [`AssistantBackend`] and may fail any way they like.
//! [`Assistant`] and [`ChatSession`] sit in front of a backend and turn
//! every failure into a fixed, user-facing string, so nothing above this
//! module ever sees an [`AssistantError`].

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// Model used when configuration does not name one.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Base URL of the Generative Language REST API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const SYSTEM_INSTRUCTION: &str = "You are an expert Agile assistant for Iterion. \
Help users with story grooming, task management, project strategies, and technical \
roadblocks. Keep responses professional, helpful, and concise.";

pub const SUMMARY_FALLBACK: &str = "Error generating AI summary. Please check your API key.";
pub const CHAT_FALLBACK: &str = "I'm having trouble connecting to my neural net. Can you try again?";
pub const EMPTY_REPLY_FALLBACK: &str = "I'm sorry, I couldn't process that.";

/// Why a backend call failed.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("API key not set: ${var} is empty or missing")]
    MissingApiKey { var: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// A text-generation service.
pub trait AssistantBackend {
    /// One-shot completion of `prompt`.
    ///
    /// # Errors
    ///
    /// Any transport, auth or parse failure.
    fn generate(&self, prompt: &str) -> Result<String, AssistantError>;

    /// Continue a conversation. `history` does not include `message`.
    ///
    /// # Errors
    ///
    /// Any transport, auth or parse failure.
    fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, AssistantError>;
}

impl<B: AssistantBackend + ?Sized> AssistantBackend for &B {
    fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        (**self).generate(prompt)
    }

    fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, AssistantError> {
        (**self).chat(history, message)
    }
}

impl<B: AssistantBackend + ?Sized> AssistantBackend for Box<B> {
    fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        (**self).generate(prompt)
    }

    fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, AssistantError> {
        (**self).chat(history, message)
    }
}

/// Build the executive-summary prompt for a story and its related items.
#[must_use]
pub fn summary_prompt<T: Serialize>(name: &str, description: &str, related: &[T]) -> String {
    let related_json = serde_json::to_string(related).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Act as a senior IT project manager. Provide a concise executive summary and 3 \
         strategic recommendations for the story: \"{name}\".\n\
         Context: {description}.\n\
         Current Tasks: {related_json}.\n\
         Format your response as clean markdown with clear headers."
    )
}

/// Failure-absorbing front for a backend.
#[derive(Debug, Clone)]
pub struct Assistant<B> {
    backend: B,
}

impl<B: AssistantBackend> Assistant<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Executive summary and recommendations, or [`SUMMARY_FALLBACK`].
    pub fn summarize<T: Serialize>(&self, name: &str, description: &str, related: &[T]) -> String {
        let prompt = summary_prompt(name, description, related);
        match self.backend.generate(&prompt) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(story = name, "assistant returned an empty summary");
                SUMMARY_FALLBACK.to_string()
            }
            Err(err) => {
                warn!(story = name, error = %err, "summary generation failed");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    /// Reply to `message`, or one of the chat fallbacks.
    pub fn chat(&self, history: &[ChatMessage], message: &str) -> String {
        match self.backend.chat(history, message) {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => EMPTY_REPLY_FALLBACK.to_string(),
            Err(err) => {
                warn!(error = %err, "chat request failed");
                CHAT_FALLBACK.to_string()
            }
        }
    }
}

/// A running conversation with the assistant.
///
/// The session always opens with a greeting, and [`ChatSession::clear`]
/// returns to just that greeting.
#[derive(Debug, Clone)]
pub struct ChatSession<B> {
    assistant: Assistant<B>,
    messages: Vec<ChatMessage>,
}

impl<B: AssistantBackend> ChatSession<B> {
    pub fn new(backend: B, org_name: &str, project_count: usize) -> Self {
        Self {
            assistant: Assistant::new(backend),
            messages: vec![ChatMessage::assistant(greeting(org_name, project_count))],
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Send a user message and append the reply.
    ///
    /// Blank input is ignored and returns `None`. The user's message is
    /// recorded before the backend is called, so it stays in the transcript
    /// even when the reply is a fallback.
    pub fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        let history_len = self.messages.len();
        self.messages.push(ChatMessage::user(text));
        debug!(turns = history_len, "sending chat message");

        let reply = self.assistant.chat(&self.messages[..history_len], text);
        self.messages.push(ChatMessage::assistant(reply));
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.truncate(1);
    }
}

fn greeting(org_name: &str, project_count: usize) -> String {
    format!(
        "Hello! I'm your Iterion AI Assistant for **{org_name}**. I've indexed your \
         {project_count} current projects. How can I assist with your operations today?"
    )
}

// ============================================================================
// Gemini REST Backend
// ============================================================================

/// Blocking client for the `generateContent` endpoint.
///
/// No timeout and no retry: a slow or failed call surfaces once as an
/// error and the caller falls back.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Read the API key from the environment variable `var`.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or blank.
    pub fn from_env(var: &str, model: impl Into<String>) -> Result<Self, AssistantError> {
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key, model)),
            _ => Err(AssistantError::MissingApiKey {
                var: var.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn post(&self, body: &serde_json::Value) -> Result<String, AssistantError> {
        let response = ureq::post(&self.url())
            .set("x-goog-api-key", &self.api_key)
            .set("Content-Type", "application/json")
            .send_json(body);

        match response {
            Ok(resp) => {
                let parsed: GenerateResponse = resp
                    .into_json()
                    .map_err(|e| AssistantError::Parse(e.to_string()))?;
                Ok(parsed.text())
            }
            Err(ureq::Error::Status(status, resp)) => Err(AssistantError::Http {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(AssistantError::Transport(e.to_string())),
        }
    }
}

impl AssistantBackend for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, AssistantError> {
        debug!(model = %self.model, "requesting summary");
        self.post(&generate_request(prompt))
    }

    fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, AssistantError> {
        debug!(model = %self.model, turns = history.len(), "requesting chat reply");
        self.post(&chat_request(history, message))
    }
}

fn content(role: &str, text: &str) -> serde_json::Value {
    json!({ "role": role, "parts": [{ "text": text }] })
}

fn generate_request(prompt: &str) -> serde_json::Value {
    json!({ "contents": [content("user", prompt)] })
}

/// The API wants the first turn to be the user's, so leading assistant
/// turns (the greeting) are dropped.
fn chat_request(history: &[ChatMessage], message: &str) -> serde_json::Value {
    let mut contents: Vec<serde_json::Value> = history
        .iter()
        .skip_while(|m| m.speaker == Speaker::Assistant)
        .map(|m| {
            let role = match m.speaker {
                Speaker::User => "user",
                Speaker::Assistant => "model",
            };
            content(role, &m.text)
        })
        .collect();
    contents.push(content("user", message));
    json!({
        "systemInstruction": { "parts": [{ "text": SYSTEM_INSTRUCTION }] },
        "contents": contents,
    })
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate; empty if there is none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}
