//! Domain records exchanged with the Promptly backend
//!
//! Create/update payloads are separate types that omit the server-assigned
//! identifier (and, for template versions, the version number).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named owner context that scopes personas, templates and prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Payload for creating or updating a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A configured voice pairing (user role, LLM role) used to generate prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub persona_id: String,
    pub user_role_display: String,
    pub llm_role_display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Payload for creating or updating a persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaDraft {
    pub user_role_display: String,
    pub llm_role_display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// A versioned, reusable prompt skeleton with named variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub persona_id: String,
    pub version: u32,
    pub meta_role: String,
    pub task: String,
    pub answer_guideline: String,
    pub template: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Payload for creating or updating a template (everything but the id)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    pub name: String,
    pub persona_id: String,
    pub version: u32,
    pub meta_role: String,
    pub task: String,
    pub answer_guideline: String,
    pub template: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Payload for publishing a new version of an existing template.
///
/// The backend assigns the version number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVersionDraft {
    pub name: String,
    pub persona_id: String,
    pub meta_role: String,
    pub task: String,
    pub answer_guideline: String,
    pub template: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

impl From<&PromptTemplate> for TemplateVersionDraft {
    fn from(template: &PromptTemplate) -> Self {
        Self {
            name: template.name.clone(),
            persona_id: template.persona_id.clone(),
            meta_role: template.meta_role.clone(),
            task: template.task.clone(),
            answer_guideline: template.answer_guideline.clone(),
            template: template.template.clone(),
            variables: template.variables.clone(),
            profile_id: template.profile_id.clone(),
        }
    }
}

/// A generated instance of a template with concrete variable values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub template_id: String,
    pub template_version: u32,
    #[serde(default)]
    pub variable_values: BTreeMap<String, String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Payload for updating a stored prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDraft {
    pub name: String,
    pub template_id: String,
    pub template_version: u32,
    #[serde(default)]
    pub variable_values: BTreeMap<String, String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Body of the prompt generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratePromptRequest {
    pub template_id: String,
    pub name: String,
    pub variable_values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of the prompt evaluation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatePromptRequest {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<String>,
}

/// Evaluation verdict. Fields the client does not know about are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptEvaluation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The signed-in user as reported by the auth `me` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl User {
    /// File name of the per-user local database
    pub fn local_database_filename(&self) -> String {
        format!("{}-{}-promptly.db", self.user_id, self.email)
    }
}
