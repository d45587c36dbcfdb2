use crate::types::{Operation, RequestDescriptor, ScalePolicy, SuggestionsResponse, Target};
use serde::{Deserialize, Serialize};

/// Storage key of the suggestions snapshot.
pub const SNAPSHOT_KEY: &str = "kube-guard-ai-suggestions-v1";
/// Maximum number of history entries kept, most recent first.
pub const HISTORY_LIMIT: usize = 50;

pub const SAFE_BAND_MIN: f64 = 0.1;
pub const SAFE_BAND_MAX: f64 = 1.2;
pub const DEFAULT_SAFE_LOW: f64 = 0.6;
pub const DEFAULT_SAFE_HIGH: f64 = 0.7;

/// Parameters of the suggestions form as last submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormParams {
    pub target: Target,
    pub node: String,
    pub namespace: String,
    pub pod: String,
    pub threshold: f64,
    pub sustain_minutes: u32,
    pub horizon_minutes: u32,
    pub step: u32,
    pub use_llm: bool,
    pub scale_policy: ScalePolicy,
    pub safe_low: f64,
    pub safe_high: f64,
}

impl Default for FormParams {
    fn default() -> Self {
        Self {
            target: Target::NodeCpu,
            node: "k3s-master".to_string(),
            namespace: "default".to_string(),
            pod: String::new(),
            threshold: 85.0,
            sustain_minutes: 15,
            horizon_minutes: 120,
            step: 60,
            use_llm: true,
            scale_policy: ScalePolicy::Stair,
            safe_low: DEFAULT_SAFE_LOW,
            safe_high: DEFAULT_SAFE_HIGH,
        }
    }
}

impl FormParams {
    /// Suggestions request for the current form; scope fields the target does not use
    /// are left out.
    pub fn to_descriptor(&self) -> RequestDescriptor {
        let mut d = RequestDescriptor::new(Operation::Suggestions, self.target)
            .horizon_minutes(self.horizon_minutes)
            .step(self.step)
            .threshold(self.threshold)
            .sustain_minutes(self.sustain_minutes)
            .use_llm(self.use_llm)
            .scale_policy(self.scale_policy)
            .safe_band(self.safe_low, self.safe_high);
        if self.target.is_node_scoped() {
            d = d.node(self.node.clone());
        } else {
            d = d.namespace(self.namespace.clone()).pod(self.pod.clone());
        }
        d
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// Epoch milliseconds.
    pub ts: i64,
    pub form: FormParams,
    pub resp: SuggestionsResponse,
}

/// Everything persisted between sessions. Always written whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub form: FormParams,
    #[serde(rename = "resp")]
    pub last_result: Option<SuggestionsResponse>,
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pod_form_targets_namespace_and_pod() {
        let form = FormParams {
            target: Target::PodCpu,
            pod: "api-0".to_string(),
            ..FormParams::default()
        };
        let d = form.to_descriptor();
        assert_eq!(d.scope.node, None);
        assert_eq!(d.scope.namespace.as_deref(), Some("default"));
        assert_eq!(d.scope.pod.as_deref(), Some("api-0"));
        assert_eq!(d.policy.safe_low, Some(DEFAULT_SAFE_LOW));
    }

    #[test]
    fn last_result_is_stored_under_resp() {
        let value = serde_json::to_value(PersistedSnapshot::default()).unwrap();
        assert!(value.get("resp").is_some());
        assert!(value.get("last_result").is_none());
    }
}
