//! Error types for decant endpoint operations

use thiserror::Error;

/// Failure to establish reachability with an endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),
}

/// Failure to discover the source column list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("source is empty: {0}")]
    SourceEmpty(String),

    #[error("could not read source schema: {0}")]
    ParseFailure(String),
}

/// Failure during the bulk read/write halves of a transfer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("failed to read from source: {0}")]
    SourceRead(String),

    #[error("failed to write to target: {0}")]
    TargetWrite(String),

    #[error("column mismatch: {0}")]
    ColumnMismatch(String),
}

/// Rejected descriptor field values, caught before any endpoint call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("port must be between 1 and 65535")]
    PortOutOfRange,

    #[error("password and bearer token are mutually exclusive")]
    CredentialConflict,

    #[error("file path must not be empty")]
    EmptyPath,

    #[error("delimiter must not be empty")]
    EmptyDelimiter,
}
