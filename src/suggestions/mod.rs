//! 建议行标识：为界面上展示的每条建议生成稳定的行键，用于反馈与已读/忽略标记。
//!
//! Suggestion row identity.
//!
//! Feedback and state-marking calls refer back to a displayed suggestion by a derived
//! row key. When the backend assigned a `suggestion_id` the key is stable across
//! sessions; without one it is only unique within a single response.

pub mod key;

pub use key::{derive_key, SuggestionKey, TITLE_PREFIX_CHARS};
