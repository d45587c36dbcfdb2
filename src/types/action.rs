use super::target::Target;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of executing (or dry-running) a suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyActionResponse {
    pub ok: bool,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub forbid: Option<bool>,
    #[serde(default)]
    pub forbid_reason: Option<String>,
    #[serde(default)]
    pub cooldown_remaining: Option<f64>,
    #[serde(default)]
    pub limit_remaining: Option<f64>,
    #[serde(default)]
    pub planned_action: Option<Map<String, Value>>,
    #[serde(default)]
    pub evidence_snapshot: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    Success,
    Fail,
    #[default]
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPayload {
    pub target: Target,
    pub key: String,
    /// Empty means `no_action`.
    #[serde(default)]
    pub action_kind: String,
    #[serde(default)]
    pub outcome: FeedbackOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub ok: bool,
    #[serde(default)]
    pub feedback_id: Option<i64>,
    #[serde(default)]
    pub evolved: Option<bool>,
    #[serde(default)]
    pub evolution: Option<Map<String, Value>>,
}

/// UI-side marking of a suggestion row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionState {
    Read,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionStateResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionStatesResponse {
    #[serde(default)]
    pub states: std::collections::BTreeMap<String, SuggestionState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSummary {
    pub suggestion_id: String,
    #[serde(default)]
    pub llm_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantChatRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_llm: Option<bool>,
}

impl AssistantChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            page: None,
            context: None,
            use_llm: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantChatResponse {
    pub reply: String,
}
