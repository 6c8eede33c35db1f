//! The capability contract implemented by each endpoint kind

use async_trait::async_trait;

use crate::{
    ConnectError, DiscoveryError, EndpointDescriptor, EndpointKind, RecordBatch, TransferError,
};

/// Connect, schema discovery, and bulk read/write for one endpoint kind.
///
/// Implementations are stateless between calls: every method receives the
/// full descriptor and holds no session, so each retry is a fresh attempt
/// with no memory of prior ones. Failure must not leak partial state.
#[async_trait]
pub trait EndpointClient: Send + Sync {
    /// Which descriptor variant this client understands
    fn kind(&self) -> EndpointKind;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Establish reachability and validate credentials
    async fn connect(&self, descriptor: &EndpointDescriptor) -> Result<(), ConnectError>;

    /// Column names offered when this endpoint acts as a source
    async fn list_source_columns(
        &self,
        descriptor: &EndpointDescriptor,
    ) -> Result<Vec<String>, DiscoveryError>;

    /// Read every row, projected to `columns` in the given order
    async fn read_records(
        &self,
        descriptor: &EndpointDescriptor,
        columns: &[String],
    ) -> Result<RecordBatch, TransferError>;

    /// Write the whole batch, returning the number of data rows written.
    /// Either the returned count reflects a complete write or the call
    /// fails; there is no partial-count success.
    async fn write_records(
        &self,
        descriptor: &EndpointDescriptor,
        batch: &RecordBatch,
    ) -> Result<u64, TransferError>;
}
