//! Delimited text file endpoint client for decant
//!
//! Files are plain delimiter-separated text with a mandatory header row.
//! This crate adapts them to the decant endpoint capability contract.

mod endpoint;

pub use endpoint::*;
