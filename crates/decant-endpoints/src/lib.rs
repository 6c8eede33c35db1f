//! Decant Endpoints - endpoint client implementations
//!
//! This crate provides the concrete implementations of the endpoint
//! capability contract defined in `decant-core`, plus the registry that
//! maps an `EndpointKind` to its client.

#[cfg(feature = "clickhouse")]
pub use decant_endpoint_clickhouse as clickhouse;
#[cfg(feature = "file")]
pub use decant_endpoint_file as file;

mod registry;

pub use registry::EndpointRegistry;

/// Re-export commonly used types from decant-core
pub use decant_core::{
    ColumnCatalog, ColumnEntry, ConnectError, DiscoveryError, EndpointClient, EndpointDescriptor,
    EndpointKind, RecordBatch, TransferError, TransferReport, Value,
};
