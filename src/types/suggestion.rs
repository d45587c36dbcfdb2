use super::target::Target;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "info" => Some(Severity::Info),
            "warning" => Some(Severity::Warning),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

/// Remediation kinds the backend can propose. Unrecognized kinds read as `NoAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ScaleHpa,
    ScaleDeployment,
    RestartDeployment,
    AddNode,
    CordonNode,
    RestartPod,
    DeletePod,
    InvestigateLogs,
    TuneRequestsLimits,
    EnableRateLimit,
    #[default]
    #[serde(other)]
    NoAction,
}

impl ActionKind {
    pub const ALL: [ActionKind; 11] = [
        ActionKind::ScaleHpa,
        ActionKind::ScaleDeployment,
        ActionKind::RestartDeployment,
        ActionKind::AddNode,
        ActionKind::CordonNode,
        ActionKind::RestartPod,
        ActionKind::DeletePod,
        ActionKind::InvestigateLogs,
        ActionKind::TuneRequestsLimits,
        ActionKind::EnableRateLimit,
        ActionKind::NoAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ScaleHpa => "scale_hpa",
            ActionKind::ScaleDeployment => "scale_deployment",
            ActionKind::RestartDeployment => "restart_deployment",
            ActionKind::AddNode => "add_node",
            ActionKind::CordonNode => "cordon_node",
            ActionKind::RestartPod => "restart_pod",
            ActionKind::DeletePod => "delete_pod",
            ActionKind::InvestigateLogs => "investigate_logs",
            ActionKind::TuneRequestsLimits => "tune_requests_limits",
            ActionKind::EnableRateLimit => "enable_rate_limit",
            ActionKind::NoAction => "no_action",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionHint {
    #[serde(default)]
    pub kind: ActionKind,
    #[serde(default)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionItem {
    #[serde(default)]
    pub severity: Severity,
    pub title: String,
    #[serde(default)]
    pub evidence: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degrade_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub action: ActionHint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub target: Target,
    pub key: String,
    #[serde(default)]
    pub suggestions: Vec<SuggestionItem>,
    #[serde(default)]
    pub suggestion_id: Option<String>,
    #[serde(default)]
    pub llm_summary: Option<String>,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_action_kind_reads_as_no_action() {
        let hint: ActionHint = serde_json::from_value(json!({"kind": "reboot_cluster"})).unwrap();
        assert_eq!(hint.kind, ActionKind::NoAction);
        assert!(hint.params.is_empty());
    }

    #[test]
    fn action_kind_names_parse_back() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn suggestions_response_tolerates_missing_optionals() {
        let resp: SuggestionsResponse = serde_json::from_value(json!({
            "target": "node_cpu",
            "key": "node:n1",
            "suggestions": [{"title": "Scale out", "action": {"kind": "add_node", "params": {"count": 1}}}]
        }))
        .unwrap();
        assert_eq!(resp.suggestions[0].severity, Severity::Info);
        assert_eq!(resp.suggestions[0].action.kind, ActionKind::AddNode);
        assert!(resp.suggestion_id.is_none());
    }
}
