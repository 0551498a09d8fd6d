//! Activity telemetry records
//!
//! These are write-only: the client builds them and posts them to the
//! tracking endpoint, it never reads them back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::User;

/// Kind of user action being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    #[serde(rename = "Login")]
    Login,
    #[serde(rename = "Logout")]
    Logout,
    #[serde(rename = "Profile_Created")]
    ProfileCreated,
    #[serde(rename = "Profile_Updated")]
    ProfileUpdated,
    #[serde(rename = "Persona_Created")]
    PersonaCreated,
    #[serde(rename = "Persona_Updated")]
    PersonaUpdated,
    #[serde(rename = "Template_Created")]
    TemplateCreated,
    #[serde(rename = "Template_Updated")]
    TemplateUpdated,
    #[serde(rename = "Prompt_Created")]
    PromptCreated,
    #[serde(rename = "Prompt_Executed_ChatGPT")]
    PromptExecutedChatGpt,
    #[serde(rename = "Prompt_Executed_Claude")]
    PromptExecutedClaude,
    #[serde(rename = "Prompt_Executed_Gemini")]
    PromptExecutedGemini,
    #[serde(rename = "Prompt_Executed_Perplexity")]
    PromptExecutedPerplexity,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Login => "Login",
            ActivityType::Logout => "Logout",
            ActivityType::ProfileCreated => "Profile_Created",
            ActivityType::ProfileUpdated => "Profile_Updated",
            ActivityType::PersonaCreated => "Persona_Created",
            ActivityType::PersonaUpdated => "Persona_Updated",
            ActivityType::TemplateCreated => "Template_Created",
            ActivityType::TemplateUpdated => "Template_Updated",
            ActivityType::PromptCreated => "Prompt_Created",
            ActivityType::PromptExecutedChatGpt => "Prompt_Executed_ChatGPT",
            ActivityType::PromptExecutedClaude => "Prompt_Executed_Claude",
            ActivityType::PromptExecutedGemini => "Prompt_Executed_Gemini",
            ActivityType::PromptExecutedPerplexity => "Prompt_Executed_Perplexity",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the reported action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityResult {
    Success,
    Failure,
    Partial,
}

/// LLM backend a prompt was executed against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmPlatform {
    ChatGpt,
    Claude,
    Gemini,
    Perplexity,
}

impl LlmPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmPlatform::ChatGpt => "chatgpt",
            LlmPlatform::Claude => "claude",
            LlmPlatform::Gemini => "gemini",
            LlmPlatform::Perplexity => "perplexity",
        }
    }

    /// Activity type reported when a prompt runs on this platform
    pub fn executed_activity(&self) -> ActivityType {
        match self {
            LlmPlatform::ChatGpt => ActivityType::PromptExecutedChatGpt,
            LlmPlatform::Claude => ActivityType::PromptExecutedClaude,
            LlmPlatform::Gemini => ActivityType::PromptExecutedGemini,
            LlmPlatform::Perplexity => ActivityType::PromptExecutedPerplexity,
        }
    }
}

/// Body posted to the tracking endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackActivityRequest {
    pub user_id: String,
    pub email: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub activity_type: ActivityType,
    pub activity_result: ActivityResult,
    #[serde(default)]
    pub activity_details: BTreeMap<String, String>,
}

/// Identity fields an activity can be attributed to.
///
/// Auth providers disagree on the identifier field name, so any of `id`,
/// `sub` or `user_id` is accepted. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ActivityUser {
    /// First non-empty identifier, in `id`, `sub`, `user_id` order
    pub fn identifier(&self) -> Option<&str> {
        [&self.id, &self.sub, &self.user_id]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|value| !value.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|value| !value.is_empty())
    }
}

impl From<&User> for ActivityUser {
    fn from(user: &User) -> Self {
        Self {
            id: None,
            sub: None,
            user_id: Some(user.user_id.clone()),
            email: Some(user.email.clone()),
        }
    }
}
