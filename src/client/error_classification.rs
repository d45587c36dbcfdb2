//! Error classification logic

use crate::error_kind::ErrorKind;
use crate::transport::TransportError;
use crate::{ClassifiedError, Error};
use tracing::info;

/// Lower-cased phrases that mark a free-text failure as a parameter problem.
///
/// Best-effort only: this depends on backend wording and is never consulted when a
/// numeric status is available.
const PARAM_PHRASES: &[&str] = &[
    "invalid parameter",
    "required",
    "must be >=",
    "must be >",
    "must be <=",
    "must be <",
    "unsupported target",
];

/// Classify any library error into the four-kind taxonomy.
///
/// Already-classified errors are returned verbatim, so classifying twice is a no-op.
pub fn classify(err: &Error) -> ClassifiedError {
    match err {
        Error::Classified(c) => c.clone(),
        Error::Transport(t) => classify_transport(t),
        other => ClassifiedError::system(other.to_string()),
    }
}

/// Classify a transport failure by its HTTP status, keeping backend detail text and
/// appending the correlation id when one is known.
pub fn classify_transport(err: &TransportError) -> ClassifiedError {
    let status = match err {
        TransportError::Status { response, .. } => Some(response.status),
        TransportError::Network { status, .. } => *status,
    };
    let kind = ErrorKind::from_http_status(status);

    let detail = err.response().and_then(|r| {
        ["detail", "message"]
            .iter()
            .filter_map(|k| r.data.get(*k).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
            .map(|s| s.to_string())
    });
    let message = match (detail, err) {
        (Some(d), _) => d,
        (None, TransportError::Network { message, .. }) if !message.is_empty() => message.clone(),
        _ => kind.default_message().to_string(),
    };

    let request_id = err
        .request_id()
        .or_else(|| err.response().and_then(|r| r.header("x-request-id")))
        .filter(|s| !s.is_empty());
    let message = match request_id {
        Some(id) => format!("{} (request_id={})", message, id),
        None => message,
    };

    info!(
        kind = kind.name(),
        http_status = status,
        request_id = request_id,
        "kube-guard request failed"
    );

    ClassifiedError::new(kind, message, status)
}

/// Secondary heuristic for failures that only exist as free text.
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    if PARAM_PHRASES.iter().any(|p| lower.contains(p)) {
        ErrorKind::Param
    } else {
        ErrorKind::System
    }
}

/// Build a classified error from free text alone (no numeric status).
///
/// The kind is decided on the bare text; the correlation id is appended afterwards.
pub(crate) fn classify_failure_text(message: impl Into<String>, request_id: Option<&str>) -> ClassifiedError {
    let message = message.into();
    let kind = classify_message(&message);
    let message = match request_id.filter(|id| !id.is_empty()) {
        Some(id) => format!("{} (request_id={})", message, id),
        None => message,
    };
    ClassifiedError::new(kind, message, None)
}
