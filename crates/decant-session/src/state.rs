//! Workflow state owned by a session

use decant_core::{ColumnCatalog, EndpointDescriptor, EndpointKind, TransferReport};
use serde::Serialize;

use crate::IngestionStage;

/// Payload carried by a succeeded operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationPayload {
    /// Column names discovered on the source
    Columns(Vec<String>),
    /// Completed transfer outcome
    Transfer(TransferReport),
}

/// Outcome of the most recent capability-backed operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LastOperation {
    #[default]
    Idle,
    Pending,
    Succeeded(OperationPayload),
    Failed(String),
}

impl LastOperation {
    pub fn is_pending(&self) -> bool {
        matches!(self, LastOperation::Pending)
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            LastOperation::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// The complete mutable record of one ingestion session.
///
/// Invariants held by the controller: source and target kinds are set
/// together and always differ; each descriptor is set only by a
/// successful configuration step; the catalog stays empty until source
/// discovery succeeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub stage: IngestionStage,
    pub source_kind: Option<EndpointKind>,
    pub target_kind: Option<EndpointKind>,
    pub source_descriptor: Option<EndpointDescriptor>,
    pub target_descriptor: Option<EndpointDescriptor>,
    pub columns: ColumnCatalog,
    pub last_operation: LastOperation,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }
}
