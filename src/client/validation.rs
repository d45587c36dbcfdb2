//! 请求预检：按操作类型检查必填的范围字段，失败时不发起网络请求。
//!
//! Pre-flight descriptor validation.
//!
//! These are shape checks only (is the scope complete enough to route the request),
//! not business validation of the values themselves.

use crate::types::{Operation, RequestDescriptor, Target};
use crate::ClassifiedError;

/// Smallest horizon the backend accepts, per operation and target.
pub(crate) fn min_horizon(operation: Operation, target: Target) -> u32 {
    match (operation, target) {
        (Operation::Forecast, Target::NodeCpu) => 15,
        (Operation::Forecast, _) => 1,
        _ => 15,
    }
}

fn present(v: &Option<String>) -> bool {
    v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Fail fast with a `param` error if the descriptor cannot be routed.
pub(crate) fn validate_descriptor(d: &RequestDescriptor) -> Result<(), ClassifiedError> {
    if d.target.is_node_scoped() && !present(&d.scope.node) {
        return Err(ClassifiedError::param("node required"));
    }
    if d.target == Target::PodCpu && !(present(&d.scope.namespace) && present(&d.scope.pod)) {
        return Err(ClassifiedError::param("namespace/pod required"));
    }

    let min = min_horizon(d.operation, d.target);
    if d.window.horizon_or_default() < min {
        return Err(ClassifiedError::param(format!(
            "horizon_minutes must be >= {}",
            min
        )));
    }

    if d.operation == Operation::Execute && d.execution.is_none() {
        return Err(ClassifiedError::param("suggestion_index required"));
    }
    Ok(())
}

/// Non-empty string argument of a pass-through call.
pub(crate) fn require(value: &str, field: &str) -> Result<(), ClassifiedError> {
    if value.trim().is_empty() {
        Err(ClassifiedError::param(format!("{} required", field)))
    } else {
        Ok(())
    }
}
