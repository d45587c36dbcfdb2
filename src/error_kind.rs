//! 错误分类：四类可操作错误（参数 / 过期 / 不支持 / 系统）及其默认文案。
//!
//! Actionable error kinds.
//!
//! Every failure surfaced to the UI carries exactly one of these kinds. Each kind has a
//! stable default message (used when the backend supplied no detail text) and a
//! remediation hint the UI can branch on.
//!
//! | Kind          | HTTP | Remediation         |
//! |---------------|------|---------------------|
//! | `param`       | 400  | re-fill a field     |
//! | `expired`     | 409  | regenerate          |
//! | `unsupported` | 501  | hide the action     |
//! | `system`      | else | generic retry       |
//!
//! ## Example
//!
//! ```rust
//! use kube_guard_client::error_kind::ErrorKind;
//!
//! assert_eq!(ErrorKind::from_http_status(Some(409)), ErrorKind::Expired);
//! assert_eq!(ErrorKind::from_http_status(None), ErrorKind::System);
//! assert_eq!(ErrorKind::Expired.name(), "expired");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Missing or invalid input, detected pre-flight or rejected by the backend
    Param,
    /// A precondition (e.g. a generated recommendation) is stale
    Expired,
    /// The operation is not implemented server-side
    Unsupported,
    /// Network failure, timeout, or anything unclassified
    System,
}

/// What the UI should offer the user for a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Remediation {
    RefillField,
    Regenerate,
    HideAction,
    Retry,
}

impl ErrorKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Param => "param",
            Self::Expired => "expired",
            Self::Unsupported => "unsupported",
            Self::System => "system",
        }
    }

    /// Message used when the backend provided no detail text.
    #[inline]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Param => "parameters invalid",
            Self::Expired => "recommendation expired, regenerate",
            Self::Unsupported => "operation unsupported",
            Self::System => "system error",
        }
    }

    #[inline]
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Param => Remediation::RefillField,
            Self::Expired => Remediation::Regenerate,
            Self::Unsupported => Remediation::HideAction,
            Self::System => Remediation::Retry,
        }
    }

    /// Maps an HTTP status to a kind. First match wins; absent status is `System`.
    pub fn from_http_status(status: Option<u16>) -> Self {
        match status {
            Some(400) => Self::Param,
            Some(409) => Self::Expired,
            Some(501) => Self::Unsupported,
            _ => Self::System,
        }
    }

    /// Parses a kind name as produced by [`ErrorKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "param" => Self::Param,
            "expired" => Self::Expired,
            "unsupported" => Self::Unsupported,
            "system" => Self::System,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
