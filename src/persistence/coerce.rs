//! 快照容错加载：逐字段校验与回退默认值，单个坏字段不影响其余字段。
//!
//! Fail-soft snapshot loading.
//!
//! The stored blob may predate the current field set, or have been edited by hand.
//! Every field is checked on its own and falls back to its default; a bad history
//! entry is dropped without affecting its neighbours.

use super::snapshot::{
    FormParams, HistoryEntry, PersistedSnapshot, DEFAULT_SAFE_HIGH, DEFAULT_SAFE_LOW,
    HISTORY_LIMIT, SAFE_BAND_MAX, SAFE_BAND_MIN,
};
use crate::types::{
    ActionHint, ActionKind, ScalePolicy, Severity, SuggestionItem, SuggestionsResponse, Target,
};
use serde_json::{Map, Value};
use tracing::warn;

/// Parses `raw` and coerces it. Never fails; a blob that is not a JSON object loads
/// as the defaults.
pub fn load_snapshot(raw: &str) -> PersistedSnapshot {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) if v.is_object() => snapshot_from_value(&v),
        Ok(_) => {
            warn!("suggestions snapshot is not an object, using defaults");
            PersistedSnapshot::default()
        }
        Err(e) => {
            warn!(error = %e, "suggestions snapshot unreadable, using defaults");
            PersistedSnapshot::default()
        }
    }
}

pub fn snapshot_from_value(v: &Value) -> PersistedSnapshot {
    let Some(obj) = v.as_object() else {
        return PersistedSnapshot::default();
    };
    PersistedSnapshot {
        form: coerce_form(obj.get("form")),
        last_result: obj.get("resp").and_then(coerce_response),
        history: coerce_history(obj.get("history")),
    }
}

fn num(v: Option<&Value>, fallback: f64) -> f64 {
    v.and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .unwrap_or(fallback)
}

fn count(v: Option<&Value>, fallback: u32) -> u32 {
    v.and_then(Value::as_f64)
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
        .unwrap_or(fallback)
}

fn text(v: Option<&Value>, fallback: &str) -> String {
    v.and_then(Value::as_str).unwrap_or(fallback).to_string()
}

fn flag(v: Option<&Value>, fallback: bool) -> bool {
    v.and_then(Value::as_bool).unwrap_or(fallback)
}

fn record(v: Option<&Value>) -> Map<String, Value> {
    v.and_then(Value::as_object).cloned().unwrap_or_default()
}

fn opt_text(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str).map(str::to_string)
}

/// Clamps both bounds into range; an empty or inverted band resets to the defaults.
pub(crate) fn safe_band(low: f64, high: f64) -> (f64, f64) {
    let low = low.clamp(SAFE_BAND_MIN, SAFE_BAND_MAX);
    let high = high.clamp(SAFE_BAND_MIN, SAFE_BAND_MAX);
    if low >= high {
        (DEFAULT_SAFE_LOW, DEFAULT_SAFE_HIGH)
    } else {
        (low, high)
    }
}

pub fn coerce_form(v: Option<&Value>) -> FormParams {
    let d = FormParams::default();
    let Some(v) = v.filter(|v| v.is_object()) else {
        return d;
    };
    let (safe_low, safe_high) = safe_band(
        num(v.get("safe_low"), d.safe_low),
        num(v.get("safe_high"), d.safe_high),
    );
    FormParams {
        target: v
            .get("target")
            .and_then(Value::as_str)
            .and_then(Target::parse)
            .unwrap_or(d.target),
        node: text(v.get("node"), &d.node),
        namespace: text(v.get("namespace"), &d.namespace),
        pod: text(v.get("pod"), &d.pod),
        threshold: num(v.get("threshold"), d.threshold),
        sustain_minutes: count(v.get("sustain_minutes"), d.sustain_minutes),
        horizon_minutes: count(v.get("horizon_minutes"), d.horizon_minutes),
        step: count(v.get("step"), d.step),
        use_llm: flag(v.get("use_llm"), d.use_llm),
        scale_policy: v
            .get("scale_policy")
            .and_then(Value::as_str)
            .and_then(ScalePolicy::parse)
            .unwrap_or(d.scale_policy),
        safe_low,
        safe_high,
    }
}

fn coerce_action(v: Option<&Value>) -> ActionHint {
    ActionHint {
        kind: v
            .and_then(|a| a.get("kind"))
            .and_then(Value::as_str)
            .and_then(ActionKind::parse)
            .unwrap_or(ActionKind::NoAction),
        params: record(v.and_then(|a| a.get("params"))),
    }
}

fn coerce_item(v: &Value) -> Option<SuggestionItem> {
    let title = v.get("title").and_then(Value::as_str).filter(|t| !t.is_empty())?;
    Some(SuggestionItem {
        severity: v
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or_default(),
        title: title.to_string(),
        evidence: record(v.get("evidence")),
        confidence: v.get("confidence").and_then(Value::as_f64),
        risk: opt_text(v.get("risk")),
        degrade_reason: opt_text(v.get("degrade_reason")),
        action_type: opt_text(v.get("action_type")),
        rationale: text(v.get("rationale"), ""),
        action: coerce_action(v.get("action")),
    })
}

/// A stored suggestions result, or `None` if its identifying fields are unusable.
pub fn coerce_response(v: &Value) -> Option<SuggestionsResponse> {
    let target = v.get("target").and_then(Value::as_str).and_then(Target::parse)?;
    let key = v.get("key").and_then(Value::as_str)?;
    let items = v.get("suggestions").and_then(Value::as_array)?;
    Some(SuggestionsResponse {
        target,
        key: key.to_string(),
        suggestions: items.iter().filter_map(coerce_item).collect(),
        suggestion_id: opt_text(v.get("suggestion_id")),
        llm_summary: opt_text(v.get("llm_summary")),
        meta: v.get("meta").and_then(Value::as_object).cloned(),
    })
}

fn coerce_entry(v: &Value) -> Option<HistoryEntry> {
    let id = v.get("id").and_then(Value::as_str).filter(|s| !s.is_empty())?;
    let ts = v.get("ts").and_then(Value::as_f64).filter(|n| n.is_finite())?;
    let resp = v.get("resp").and_then(coerce_response)?;
    Some(HistoryEntry {
        id: id.to_string(),
        ts: ts as i64,
        form: coerce_form(v.get("form")),
        resp,
    })
}

pub fn coerce_history(v: Option<&Value>) -> Vec<HistoryEntry> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(coerce_entry)
                .take(HISTORY_LIMIT)
                .collect()
        })
        .unwrap_or_default()
}
