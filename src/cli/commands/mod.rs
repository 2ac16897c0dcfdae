//! Command implementations.

pub mod board;
pub mod chat;
pub mod completions;
pub mod dashboard;
pub mod discover;
pub mod doctor;
pub mod orgs;
pub mod summarize;
pub mod team;
pub mod version;

use tracing::{debug, warn};

use iterion_lib::OrgScope;
use iterion_lib::assistant::{AssistantBackend, AssistantError, ChatMessage, GeminiClient};

use crate::config::AssistantConfig;

/// Map a user name to its id within the org; anything else passes through.
pub(crate) fn resolve_user_ref(scope: &OrgScope<'_>, value: &str) -> String {
    if scope.user(value).is_some() {
        return value.to_string();
    }
    scope
        .users
        .iter()
        .find(|u| u.name.eq_ignore_ascii_case(value))
        .map_or_else(|| value.to_string(), |u| u.id.clone())
}

/// Map an epic name to its id within the org; anything else passes through.
pub(crate) fn resolve_epic_ref(scope: &OrgScope<'_>, value: &str) -> String {
    scope
        .epics
        .iter()
        .find(|e| e.id == value)
        .or_else(|| scope.epics.iter().find(|e| e.name.eq_ignore_ascii_case(value)))
        .map_or_else(|| value.to_string(), |e| e.id.clone())
}

/// Stand-in backend when no API key is configured.
///
/// Every call fails, so the assistant answers with its fallback text.
#[derive(Debug, Clone)]
pub(crate) struct Unavailable {
    var: String,
}

impl AssistantBackend for Unavailable {
    fn generate(&self, _prompt: &str) -> Result<String, AssistantError> {
        Err(AssistantError::MissingApiKey {
            var: self.var.clone(),
        })
    }

    fn chat(&self, _history: &[ChatMessage], _message: &str) -> Result<String, AssistantError> {
        Err(AssistantError::MissingApiKey {
            var: self.var.clone(),
        })
    }
}

/// Gemini when its API key is set, otherwise [`Unavailable`].
pub(crate) fn assistant_backend(config: &AssistantConfig) -> Box<dyn AssistantBackend> {
    match GeminiClient::from_env(&config.api_key_env, config.model.clone()) {
        Ok(client) => {
            debug!(model = client.model(), endpoint = %config.endpoint, "using Gemini backend");
            Box::new(client.with_endpoint(config.endpoint.clone()))
        }
        Err(err) => {
            warn!(error = %err, "assistant offline, replies will be fallbacks");
            Box::new(Unavailable {
                var: config.api_key_env.clone(),
            })
        }
    }
}
