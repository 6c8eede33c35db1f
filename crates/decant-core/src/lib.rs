//! Decant Core - shared types and the endpoint capability contract
//!
//! This crate provides the fundamental types that all other decant crates
//! depend on. It defines:
//!
//! - `EndpointClient` - Trait implemented by each endpoint kind
//! - `EndpointDescriptor` - Tagged union of per-kind connection settings
//! - `ColumnCatalog` - Discovered columns with selection flags
//! - The error taxonomy for connect, discovery, and transfer failures
//! - Common types like `Value`, `RecordBatch`, `TransferReport`

mod catalog;
mod client;
mod endpoint;
mod error;
mod records;

pub use catalog::*;
pub use client::*;
pub use endpoint::*;
pub use error::*;
pub use records::*;
