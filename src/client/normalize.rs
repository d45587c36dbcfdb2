//! 响应形态判定：同步结果还是需要轮询的任务句柄。
//!
//! Response shape arbitration.
//!
//! The backend may answer an operation inline or with a task handle, and may switch
//! between the two per deployment. The decision is made from the body's shape alone:
//! a non-empty job id with none of the operation's terminal fields means "poll";
//! anything else is the terminal result.

use crate::tasks::{job_id, JobHandle};
use crate::types::Operation;
use crate::ClassifiedError;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    Terminal(Value),
    Pending(JobHandle),
}

fn has_terminal_fields(operation: Operation, body: &Value) -> bool {
    operation
        .terminal_fields()
        .iter()
        .any(|f| body.get(*f).map(|v| !v.is_null()).unwrap_or(false))
}

pub fn inspect_shape(operation: Operation, body: Value) -> ResponseShape {
    if job_id(&body).is_some() && !has_terminal_fields(operation, &body) {
        return ResponseShape::Pending(JobHandle::from_value(&body));
    }
    ResponseShape::Terminal(body)
}

/// Decode a terminal payload into the operation's typed result.
pub fn decode_terminal<T: DeserializeOwned>(
    operation: Operation,
    value: Value,
) -> Result<T, ClassifiedError> {
    if value.is_null() {
        return Err(ClassifiedError::system("task finished without result"));
    }
    serde_json::from_value(value).map_err(|e| {
        ClassifiedError::system(format!("unexpected {} response: {}", operation.name(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_kind::ErrorKind;
    use crate::tasks::JobStatus;
    use crate::types::SuggestionsResponse;
    use serde_json::json;

    #[test]
    fn submission_body_is_pending() {
        match inspect_shape(Operation::Forecast, json!({"task_id": "t-1", "status": "PENDING"})) {
            ResponseShape::Pending(h) => {
                assert_eq!(h.id, "t-1");
                assert_eq!(h.status, JobStatus::Pending);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn terminal_fields_win_over_a_job_id() {
        let body = json!({"task_id": "t-1", "suggestions": []});
        assert!(matches!(
            inspect_shape(Operation::Suggestions, body),
            ResponseShape::Terminal(_)
        ));
    }

    #[test]
    fn empty_job_id_is_terminal() {
        let body = json!({"task_id": "", "status": "PENDING"});
        assert!(matches!(
            inspect_shape(Operation::Execute, body),
            ResponseShape::Terminal(_)
        ));
    }

    #[test]
    fn execute_submission_with_ok_flag_is_pending() {
        let body = json!({"ok": true, "task_id": "e-1", "status": "PENDING"});
        match inspect_shape(Operation::Execute, body) {
            ResponseShape::Pending(h) => assert_eq!(h.id, "e-1"),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn null_terminal_field_does_not_count() {
        let body = json!({"task_id": "t-2", "detail": null});
        assert!(matches!(
            inspect_shape(Operation::Execute, body),
            ResponseShape::Pending(_)
        ));
    }

    #[test]
    fn decode_rejects_null_and_mismatched_payloads() {
        let err = decode_terminal::<SuggestionsResponse>(Operation::Suggestions, Value::Null)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::System);
        assert_eq!(err.message, "task finished without result");

        let err = decode_terminal::<SuggestionsResponse>(Operation::Suggestions, json!({"x": 1}))
            .unwrap_err();
        assert!(err.message.starts_with("unexpected suggestions response"));
    }
}
