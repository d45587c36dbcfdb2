//! 请求与结果类型：请求描述、预测、建议与执行结果。
//!
//! Request descriptors and typed results.

pub mod action;
pub mod descriptor;
pub mod forecast;
pub mod suggestion;
pub mod target;

pub use action::{
    ApplyActionResponse, AssistantChatRequest, AssistantChatResponse, FeedbackOutcome,
    FeedbackPayload, FeedbackResponse, SuggestionState, SuggestionStateResponse,
    SuggestionStatesResponse,
    SuggestionSummary,
};
pub use descriptor::{ExecutionParams, Operation, PolicyKnobs, RequestDescriptor, Scope, TimeWindow};
pub use forecast::{BandPoint, ErrorMetrics, ForecastResponse, TsPoint};
pub use suggestion::{ActionHint, ActionKind, Severity, SuggestionItem, SuggestionsResponse};
pub use target::{ScalePolicy, Target};
