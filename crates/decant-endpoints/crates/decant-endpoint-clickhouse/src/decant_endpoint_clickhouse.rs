//! ClickHouse endpoint client for decant
//!
//! ClickHouse is a column-oriented database management system for online
//! analytical processing (OLAP). This crate adapts it to the decant
//! endpoint capability contract over the ClickHouse HTTP interface.

mod endpoint;
#[cfg(test)]
mod endpoint_tests;

pub use endpoint::*;
