//! Row key derivation.

use crate::types::{SuggestionItem, SuggestionsResponse};
use serde::{Deserialize, Serialize};

/// Title characters kept in a row key.
pub const TITLE_PREFIX_CHARS: usize = 40;

const DELIMITER: char = '|';
const UNKNOWN: &str = "unknown";
const NO_ID: &str = "none";
const NO_ACTION: &str = "no_action";
const UNTITLED: &str = "untitled";

/// Components of a row key, already normalized to their placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SuggestionKey {
    pub target: String,
    pub key: String,
    pub suggestion_id: String,
    pub index: i64,
    pub action_kind: String,
    pub title: String,
}

impl SuggestionKey {
    pub fn new(
        resp: Option<&SuggestionsResponse>,
        index: Option<i64>,
        item: Option<&SuggestionItem>,
    ) -> Self {
        let suggestion_id = resp
            .and_then(|r| r.suggestion_id.as_deref())
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(NO_ID);
        let title = item
            .map(|i| i.title.as_str())
            .filter(|t| !t.is_empty())
            .map(title_prefix)
            .unwrap_or_else(|| UNTITLED.to_string());

        Self {
            target: resp
                .map(|r| r.target.as_str())
                .unwrap_or(UNKNOWN)
                .to_string(),
            key: resp.map(|r| r.key.as_str()).unwrap_or(UNKNOWN).to_string(),
            suggestion_id: suggestion_id.to_string(),
            index: index.unwrap_or(-1),
            action_kind: item
                .map(|i| i.action.kind.as_str())
                .unwrap_or(NO_ACTION)
                .to_string(),
            title,
        }
    }

    /// `true` when the key carries a backend-assigned id and is stable across sessions.
    pub fn is_stable(&self) -> bool {
        self.suggestion_id != NO_ID
    }
}

impl std::fmt::Display for SuggestionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let d = DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            self.target, self.key, self.suggestion_id, self.index, self.action_kind, self.title
        )
    }
}

fn title_prefix(title: &str) -> String {
    title.chars().take(TITLE_PREFIX_CHARS).collect()
}

/// Row key of the `index`-th suggestion in `resp`.
///
/// Total: missing inputs degrade to placeholder tokens instead of failing.
pub fn derive_key(
    resp: Option<&SuggestionsResponse>,
    index: Option<i64>,
    item: Option<&SuggestionItem>,
) -> String {
    SuggestionKey::new(resp, index, item).to_string()
}
