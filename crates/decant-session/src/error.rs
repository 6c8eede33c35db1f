use decant_core::{DescriptorError, EndpointKind};
use thiserror::Error;

use crate::IngestionStage;

pub type SessionResult<T> = Result<T, SessionError>;

/// Intent rejections with user-facing messages.
///
/// A rejected intent never mutates the workflow state. Capability-call
/// failures are not errors at this level; they are recorded in the state
/// as `LastOperation::Failed`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("{intent} is not valid in the {stage} stage")]
    StageMismatch {
        intent: &'static str,
        stage: IngestionStage,
    },

    #[error("another operation is still pending")]
    OperationInFlight,

    #[error("expected a {expected} descriptor, got {actual}")]
    DescriptorKindMismatch {
        expected: EndpointKind,
        actual: EndpointKind,
    },

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("column {0:?} is not in the catalog")]
    UnknownColumn(String),

    #[error("no columns selected")]
    NoColumnsSelected,

    #[error("no endpoint client registered for {0}")]
    UnsupportedKind(EndpointKind),

    #[error("the session was reset while the operation was running")]
    Cancelled,
}
