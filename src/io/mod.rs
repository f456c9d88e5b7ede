//! Input/output helpers.
//!
//! - CSV admissions-table ingest (`ingest`)
//! - result exports (JSON/CSV) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
