//! Ingestion session controller
//!
//! Owns the workflow state and drives every stage transition. Intents are
//! validated and applied under a lock; capability calls run with the lock
//! released. An epoch counter detaches in-flight calls from a session
//! that was reset while they ran, so their late results are discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use decant_core::{ColumnCatalog, EndpointClient, EndpointDescriptor, EndpointKind};
use decant_endpoints::EndpointRegistry;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::envelope::SessionSnapshot;
use crate::error::{SessionError, SessionResult};
use crate::state::{LastOperation, OperationPayload, WorkflowState};
use crate::transfer::execute_transfer;
use crate::IngestionStage;

/// Workflow controller for one ingestion session.
///
/// Clones share the same underlying state, so one handle can observe or
/// reset the session while another has an operation in flight. Separate
/// sessions are fully independent.
#[derive(Clone)]
pub struct IngestionSession {
    id: Uuid,
    registry: Arc<EndpointRegistry>,
    shared: Arc<Shared>,
}

struct Shared {
    state: RwLock<WorkflowState>,
    epoch: AtomicU64,
}

impl IngestionSession {
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(session = %id, "created ingestion session");
        Self {
            id,
            registry,
            shared: Arc::new(Shared {
                state: RwLock::new(WorkflowState::new()),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Read-only view of the current state
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&*self.shared.state.read())
    }

    /// Pick the source kind; the target becomes the opposite kind and the
    /// session advances to source configuration.
    #[tracing::instrument(skip(self), fields(session = %self.id))]
    pub fn choose_source(&self, kind: EndpointKind) -> SessionResult<SessionSnapshot> {
        let mut state = self.shared.state.write();
        Self::ensure_not_pending(&state)?;
        Self::ensure_stage(&state, IngestionStage::ChooseSource, "choose_source")?;

        state.source_kind = Some(kind);
        state.target_kind = Some(kind.other());
        state.stage = IngestionStage::ConfigureSource;
        tracing::info!(source = %kind, target = %kind.other(), "source kind chosen");
        Ok(SessionSnapshot::from(&*state))
    }

    /// Validate the source descriptor, probe the endpoint, and discover
    /// its columns.
    ///
    /// On success the session advances to column selection. On a
    /// capability failure the stage stays put, the failure message lands
    /// in `last_operation`, and the descriptor is dropped, so a retry
    /// must resubmit a full descriptor.
    #[tracing::instrument(skip(self, descriptor), fields(session = %self.id))]
    pub async fn submit_source_config(
        &self,
        descriptor: EndpointDescriptor,
    ) -> SessionResult<SessionSnapshot> {
        let (client, epoch) = {
            let mut state = self.shared.state.write();
            Self::ensure_not_pending(&state)?;
            Self::ensure_stage(&state, IngestionStage::ConfigureSource, "submit_source_config")?;
            let expected = Self::required_kind(state.source_kind, "submit_source_config", &state)?;
            if descriptor.kind() != expected {
                return Err(SessionError::DescriptorKindMismatch {
                    expected,
                    actual: descriptor.kind(),
                });
            }
            descriptor.validate()?;
            let client = self
                .registry
                .get(expected)
                .ok_or(SessionError::UnsupportedKind(expected))?;

            state.last_operation = LastOperation::Pending;
            (client, self.shared.epoch.load(Ordering::SeqCst))
        };

        let outcome = Self::discover(client.as_ref(), &descriptor).await;

        let mut state = self.shared.state.write();
        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("discarding discovery result from a reset session");
            return Err(SessionError::Cancelled);
        }
        match outcome {
            Ok(catalog) => {
                let names: Vec<String> = catalog
                    .entries()
                    .iter()
                    .map(|entry| entry.name.clone())
                    .collect();
                state.columns = catalog;
                state.source_descriptor = Some(descriptor);
                state.stage = IngestionStage::SelectColumns;
                state.last_operation = LastOperation::Succeeded(OperationPayload::Columns(names));
                tracing::info!(column_count = state.columns.len(), "source configured");
            }
            Err(message) => {
                state.last_operation = LastOperation::Failed(message.clone());
                tracing::warn!(error = %message, "source configuration failed");
            }
        }
        Ok(SessionSnapshot::from(&*state))
    }

    /// Flip one column's selection flag
    pub fn toggle_column(&self, name: &str) -> SessionResult<SessionSnapshot> {
        let mut state = self.shared.state.write();
        Self::ensure_not_pending(&state)?;
        Self::ensure_stage(&state, IngestionStage::SelectColumns, "toggle_column")?;
        if !state.columns.toggle(name) {
            return Err(SessionError::UnknownColumn(name.to_string()));
        }
        Ok(SessionSnapshot::from(&*state))
    }

    pub fn select_all_columns(&self) -> SessionResult<SessionSnapshot> {
        let mut state = self.shared.state.write();
        Self::ensure_not_pending(&state)?;
        Self::ensure_stage(&state, IngestionStage::SelectColumns, "select_all_columns")?;
        state.columns.select_all();
        Ok(SessionSnapshot::from(&*state))
    }

    pub fn deselect_all_columns(&self) -> SessionResult<SessionSnapshot> {
        let mut state = self.shared.state.write();
        Self::ensure_not_pending(&state)?;
        Self::ensure_stage(&state, IngestionStage::SelectColumns, "deselect_all_columns")?;
        state.columns.deselect_all();
        Ok(SessionSnapshot::from(&*state))
    }

    /// Lock in the selection; requires at least one selected column
    pub fn confirm_columns(&self) -> SessionResult<SessionSnapshot> {
        let mut state = self.shared.state.write();
        Self::ensure_not_pending(&state)?;
        Self::ensure_stage(&state, IngestionStage::SelectColumns, "confirm_columns")?;
        if state.columns.selected_count() == 0 {
            return Err(SessionError::NoColumnsSelected);
        }
        state.stage = IngestionStage::ConfigureTarget;
        tracing::info!(
            session = %self.id,
            selected = state.columns.selected_count(),
            "columns confirmed"
        );
        Ok(SessionSnapshot::from(&*state))
    }

    /// Store the target descriptor and advance to the transfer stage.
    /// The target is not probed or discovered before the transfer itself.
    pub fn submit_target_config(
        &self,
        descriptor: EndpointDescriptor,
    ) -> SessionResult<SessionSnapshot> {
        let mut state = self.shared.state.write();
        Self::ensure_not_pending(&state)?;
        Self::ensure_stage(&state, IngestionStage::ConfigureTarget, "submit_target_config")?;
        let expected = Self::required_kind(state.target_kind, "submit_target_config", &state)?;
        if descriptor.kind() != expected {
            return Err(SessionError::DescriptorKindMismatch {
                expected,
                actual: descriptor.kind(),
            });
        }
        descriptor.validate()?;
        if !self.registry.has(expected) {
            return Err(SessionError::UnsupportedKind(expected));
        }
        state.target_descriptor = Some(descriptor);
        state.stage = IngestionStage::ReadyToTransfer;
        tracing::info!(session = %self.id, target = %expected, "target configured");
        Ok(SessionSnapshot::from(&*state))
    }

    /// Run the transfer with the stored descriptors and selected columns.
    ///
    /// Retriable: a failure keeps the session in ReadyToTransfer with
    /// both descriptors intact, so calling again reruns the transfer.
    #[tracing::instrument(skip(self), fields(session = %self.id))]
    pub async fn start_transfer(&self) -> SessionResult<SessionSnapshot> {
        let (source, target, source_descriptor, target_descriptor, columns, epoch) = {
            let mut state = self.shared.state.write();
            Self::ensure_not_pending(&state)?;
            Self::ensure_stage(&state, IngestionStage::ReadyToTransfer, "start_transfer")?;
            let source_kind = Self::required_kind(state.source_kind, "start_transfer", &state)?;
            let target_kind = Self::required_kind(state.target_kind, "start_transfer", &state)?;
            let source_descriptor = state.source_descriptor.clone().ok_or(
                SessionError::StageMismatch {
                    intent: "start_transfer",
                    stage: state.stage,
                },
            )?;
            let target_descriptor = state.target_descriptor.clone().ok_or(
                SessionError::StageMismatch {
                    intent: "start_transfer",
                    stage: state.stage,
                },
            )?;
            let source = self
                .registry
                .get(source_kind)
                .ok_or(SessionError::UnsupportedKind(source_kind))?;
            let target = self
                .registry
                .get(target_kind)
                .ok_or(SessionError::UnsupportedKind(target_kind))?;
            let columns = state.columns.selected_names();
            if columns.is_empty() {
                return Err(SessionError::NoColumnsSelected);
            }

            state.last_operation = LastOperation::Pending;
            (
                source,
                target,
                source_descriptor,
                target_descriptor,
                columns,
                self.shared.epoch.load(Ordering::SeqCst),
            )
        };

        let outcome = execute_transfer(
            source.as_ref(),
            &source_descriptor,
            target.as_ref(),
            &target_descriptor,
            &columns,
        )
        .await;

        let mut state = self.shared.state.write();
        if self.shared.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!("discarding transfer result from a reset session");
            return Err(SessionError::Cancelled);
        }
        match outcome {
            Ok(report) => {
                state.stage = IngestionStage::Complete;
                state.last_operation = LastOperation::Succeeded(OperationPayload::Transfer(report));
                tracing::info!(record_count = report.record_count, "transfer succeeded");
            }
            Err(e) => {
                let message = e.to_string();
                state.last_operation = LastOperation::Failed(message.clone());
                tracing::warn!(error = %message, "transfer failed");
            }
        }
        Ok(SessionSnapshot::from(&*state))
    }

    /// Abandon everything and return to a fresh ChooseSource state.
    ///
    /// Legal at any time, including while an operation is pending; the
    /// pending operation resolves as cancelled and its result never
    /// touches the fresh state.
    #[tracing::instrument(skip(self), fields(session = %self.id))]
    pub fn reset(&self) -> SessionSnapshot {
        let mut state = self.shared.state.write();
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        *state = WorkflowState::new();
        tracing::info!("session reset");
        SessionSnapshot::from(&*state)
    }

    /// Probe the endpoint and turn its column list into a catalog
    async fn discover(
        client: &dyn EndpointClient,
        descriptor: &EndpointDescriptor,
    ) -> Result<ColumnCatalog, String> {
        client
            .connect(descriptor)
            .await
            .map_err(|e| e.to_string())?;
        let names = client
            .list_source_columns(descriptor)
            .await
            .map_err(|e| e.to_string())?;
        ColumnCatalog::from_discovery(names).map_err(|e| e.to_string())
    }

    fn ensure_not_pending(state: &WorkflowState) -> SessionResult<()> {
        if state.last_operation.is_pending() {
            return Err(SessionError::OperationInFlight);
        }
        Ok(())
    }

    fn ensure_stage(
        state: &WorkflowState,
        expected: IngestionStage,
        intent: &'static str,
    ) -> SessionResult<()> {
        if state.stage != expected {
            return Err(SessionError::StageMismatch {
                intent,
                stage: state.stage,
            });
        }
        Ok(())
    }

    fn required_kind(
        kind: Option<EndpointKind>,
        intent: &'static str,
        state: &WorkflowState,
    ) -> SessionResult<EndpointKind> {
        kind.ok_or(SessionError::StageMismatch {
            intent,
            stage: state.stage,
        })
    }
}

impl std::fmt::Debug for IngestionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionSession")
            .field("id", &self.id)
            .field("stage", &self.shared.state.read().stage)
            .finish()
    }
}
