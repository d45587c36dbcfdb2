use crate::client::error_classification::classify_transport;
use crate::client::normalize::{decode_terminal, inspect_shape, ResponseShape};
use crate::client::validation::{require, validate_descriptor};
use crate::config::ClientConfig;
use crate::tasks::poller::TaskPoller;
use crate::transport::{Transport, TransportRequest};
use crate::types::{
    ApplyActionResponse, AssistantChatRequest, AssistantChatResponse, FeedbackPayload,
    FeedbackResponse, ForecastResponse, Operation, RequestDescriptor, SuggestionState,
    SuggestionStateResponse, SuggestionStatesResponse, SuggestionSummary, SuggestionsResponse,
};
use crate::{ClassifiedError, OpResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Client for the Kube-Guard AI endpoints.
///
/// Every operation either returns its typed result or a [`ClassifiedError`]; inline
/// answers and background tasks look the same to the caller.
pub struct OpsClient {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) config: ClientConfig,
    pub(crate) poller: TaskPoller,
}

/// Outcome of [`OpsClient::resolve_in`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    Failed(ClassifiedError),
    /// A newer request took over the poller slot; nothing should be rendered.
    Superseded,
}

impl<T> Resolution<T> {
    pub fn into_result(self) -> Option<OpResult<T>> {
        match self {
            Resolution::Resolved(v) => Some(Ok(v)),
            Resolution::Failed(e) => Some(Err(e)),
            Resolution::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Resolution::Superseded)
    }
}

impl OpsClient {
    /// Client configured from `KUBE_GUARD_*` environment variables.
    pub fn new() -> crate::Result<Self> {
        crate::client::builder::OpsClientBuilder::new().build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The client's shared poller slot.
    pub fn poller(&self) -> &TaskPoller {
        &self.poller
    }

    /// An independent poller slot using the configured status path and intervals.
    pub fn new_poller(&self) -> TaskPoller {
        TaskPoller::new(
            self.transport.clone(),
            self.config.task_status_path.clone(),
            self.config.poll,
        )
    }

    /// Resolves `descriptor` on a private slot, so concurrent calls never supersede
    /// each other.
    pub async fn resolve<T: DeserializeOwned + Send + 'static>(
        &self,
        descriptor: &RequestDescriptor,
    ) -> OpResult<T> {
        let slot = self.new_poller();
        match self.resolve_in(&slot, descriptor).await {
            Resolution::Resolved(v) => Ok(v),
            Resolution::Failed(e) => Err(e),
            Resolution::Superseded => Err(ClassifiedError::system("request superseded")),
        }
    }

    /// Resolves `descriptor` on `poller`.
    ///
    /// Pre-flight failures return before any network call and leave the slot alone.
    /// Otherwise the slot's token is taken before the request is sent, so a later
    /// call on the same slot supersedes this one whether the backend answers inline
    /// or with a task.
    pub async fn resolve_in<T: DeserializeOwned + Send + 'static>(
        &self,
        poller: &TaskPoller,
        descriptor: &RequestDescriptor,
    ) -> Resolution<T> {
        if let Err(e) = validate_descriptor(descriptor) {
            debug!(
                operation = descriptor.operation.name(),
                message = e.message.as_str(),
                "kube-guard pre-flight rejected request"
            );
            return Resolution::Failed(e);
        }

        let operation = descriptor.operation;
        let ticket = poller.begin();
        let request_id = Uuid::new_v4().to_string();
        info!(
            operation = operation.name(),
            target = descriptor.target.as_str(),
            request_id = request_id.as_str(),
            "kube-guard request"
        );

        let request = TransportRequest::new(operation.method(), operation.path())
            .with_query(descriptor.to_query())
            .with_request_id(request_id);
        let sent = self.transport.send(request).await;

        let outcome = match sent {
            Err(e) => Err(classify_transport(&e)),
            Ok(resp) => match inspect_shape(operation, resp.body.into_json()) {
                ResponseShape::Terminal(value) => {
                    debug!(operation = operation.name(), "kube-guard inline result");
                    decode_terminal::<T>(operation, value.clone()).map(|decoded| (decoded, value))
                }
                ResponseShape::Pending(handle) => {
                    info!(
                        operation = operation.name(),
                        task_id = handle.id.as_str(),
                        "kube-guard task submitted"
                    );
                    let polled = poller
                        .poll_decoded(ticket, &handle.id, None, move |value| {
                            decode_terminal::<T>(operation, value)
                        })
                        .await;
                    return match polled.into_result() {
                        Some(Ok(v)) => Resolution::Resolved(v),
                        Some(Err(e)) => Resolution::Failed(e),
                        None => Resolution::Superseded,
                    };
                }
            },
        };

        // The slot records what the caller receives: a payload that does not decode
        // is a failure here too.
        let recorded = match &outcome {
            Ok((_, raw)) => Ok(raw.clone()),
            Err(e) => Err(e.clone()),
        };
        if !poller.complete(&ticket, &recorded) {
            return Resolution::Superseded;
        }
        match outcome {
            Ok((v, _)) => Resolution::Resolved(v),
            Err(e) => Resolution::Failed(e),
        }
    }

    pub async fn forecast(&self, descriptor: &RequestDescriptor) -> OpResult<ForecastResponse> {
        expect_operation(descriptor, Operation::Forecast)?;
        self.resolve(descriptor).await
    }

    pub async fn suggestions(&self, descriptor: &RequestDescriptor) -> OpResult<SuggestionsResponse> {
        expect_operation(descriptor, Operation::Suggestions)?;
        self.resolve(descriptor).await
    }

    pub async fn execute(&self, descriptor: &RequestDescriptor) -> OpResult<ApplyActionResponse> {
        expect_operation(descriptor, Operation::Execute)?;
        self.resolve(descriptor).await
    }

    pub async fn suggestion_summary(&self, suggestion_id: &str) -> OpResult<SuggestionSummary> {
        require(suggestion_id, "suggestion_id")?;
        let request = TransportRequest::get("/api/ai/suggestions/summary")
            .with_query(vec![("suggestion_id".to_string(), suggestion_id.to_string())]);
        self.call(request).await
    }

    pub async fn assistant_chat(&self, request: &AssistantChatRequest) -> OpResult<AssistantChatResponse> {
        require(&request.message, "message")?;
        let request = TransportRequest::post("/api/ai/assistant/chat").with_body(to_body(request)?);
        self.call(request).await
    }

    /// Records operator feedback. An empty `action_kind` is sent as `no_action`.
    pub async fn feedback(&self, payload: &FeedbackPayload) -> OpResult<FeedbackResponse> {
        require(&payload.key, "key")?;
        let mut body = to_body(payload)?;
        if payload.action_kind.trim().is_empty() {
            body["action_kind"] = Value::from("no_action");
        }
        self.call(TransportRequest::post("/api/ai/feedback").with_body(body))
            .await
    }

    pub async fn mark_suggestion_state(
        &self,
        row_key: &str,
        state: SuggestionState,
    ) -> OpResult<SuggestionStateResponse> {
        require(row_key, "row_key")?;
        let body = json!({ "row_key": row_key, "status": state });
        self.call(TransportRequest::post("/api/ai/suggestions/state").with_body(body))
            .await
    }

    pub async fn fetch_suggestion_states(&self, row_keys: &[String]) -> OpResult<SuggestionStatesResponse> {
        if row_keys.is_empty() {
            return Err(ClassifiedError::param("row_keys required"));
        }
        let body = json!({ "row_keys": row_keys });
        self.call(TransportRequest::post("/api/ai/suggestions/states").with_body(body))
            .await
    }

    async fn call<T: DeserializeOwned>(&self, request: TransportRequest) -> OpResult<T> {
        let request_id = Uuid::new_v4().to_string();
        let path = request.path.clone();
        debug!(path = path.as_str(), request_id = request_id.as_str(), "kube-guard call");
        let resp = self
            .transport
            .send(request.with_request_id(request_id))
            .await
            .map_err(|e| classify_transport(&e))?;
        serde_json::from_value(resp.body.into_json()).map_err(|e| {
            ClassifiedError::system(format!("unexpected response from {}: {}", path, e))
        })
    }
}

fn expect_operation(descriptor: &RequestDescriptor, operation: Operation) -> OpResult<()> {
    if descriptor.operation != operation {
        return Err(ClassifiedError::param(format!(
            "{} descriptor passed to {}",
            descriptor.operation.name(),
            operation.name()
        )));
    }
    Ok(())
}

fn to_body<S: Serialize>(payload: &S) -> OpResult<Value> {
    serde_json::to_value(payload)
        .map_err(|e| ClassifiedError::system(format!("failed to encode request: {}", e)))
}
