//! # ole-core
//! Foundation types and traits for the OLE reward distributor.

pub mod constants;
pub mod error;
pub mod merkle;
pub mod traits;
pub mod types;
