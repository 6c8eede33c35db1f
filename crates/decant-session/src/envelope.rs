//! Uniform response envelope and the serialized session view

use decant_core::{ColumnEntry, EndpointDescriptor, EndpointKind};
use serde::Serialize;

use crate::state::{LastOperation, WorkflowState};
use crate::IngestionStage;

/// Envelope every caller-facing response is wrapped in.
///
/// Exactly one of `data` or `error` is set; `message` optionally rides
/// along with `data` for human-readable confirmations. Unset fields are
/// omitted from the serialized form rather than emitted as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }

    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Serializable view of the workflow state.
///
/// Descriptors round-trip exactly as submitted, including credentials,
/// so a caller can re-render its configuration forms from the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub stage: IngestionStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<EndpointKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_kind: Option<EndpointKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_descriptor: Option<EndpointDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_descriptor: Option<EndpointDescriptor>,
    pub columns: Vec<ColumnEntry>,
    pub last_operation: LastOperation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&WorkflowState> for SessionSnapshot {
    fn from(state: &WorkflowState) -> Self {
        Self {
            stage: state.stage,
            source_kind: state.source_kind,
            target_kind: state.target_kind,
            source_descriptor: state.source_descriptor.clone(),
            target_descriptor: state.target_descriptor.clone(),
            columns: state.columns.entries().to_vec(),
            last_operation: state.last_operation.clone(),
            error_message: state.last_operation.failure_message().map(String::from),
        }
    }
}
