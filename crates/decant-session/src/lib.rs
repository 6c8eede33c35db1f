//! Decant Session Layer
//!
//! This crate provides the workflow controller that guides an operator
//! through a staged ingestion: pick a source, configure and probe it,
//! choose columns, configure the target, transfer.
//!
//! # Architecture
//!
//! ```text
//! Presentation (forms, transport)
//!     ↓ intents / snapshots
//! Session Layer (decant-session) ← This crate
//!     ↓ capability calls
//! Endpoint Layer (decant-endpoints)
//!     ↓
//! Core types (decant-core)
//! ```
//!
//! # Design Principles
//!
//! 1. **No presentation dependencies** - the session exposes intents and
//!    read-only snapshots, never rendering concerns
//! 2. **All-or-nothing transitions** - each intent either applies fully
//!    or leaves the state untouched
//! 3. **Single in-flight operation** - a pending capability call blocks
//!    every other mutating intent until it settles
//! 4. **Reset is always legal** - and detaches any in-flight call, whose
//!    late result is discarded

mod envelope;
mod error;
mod session;
mod stage;
mod state;
mod transfer;

pub use envelope::{ResponseEnvelope, SessionSnapshot};
pub use error::{SessionError, SessionResult};
pub use session::IngestionSession;
pub use stage::IngestionStage;
pub use state::{LastOperation, OperationPayload, WorkflowState};
pub use transfer::execute_transfer;

/// Re-export commonly used types from decant-core
pub use decant_core::{
    ColumnEntry, DatabaseConfig, EndpointDescriptor, EndpointKind, FileConfig, TransferReport,
};
