//! Reporting utilities: run summary and per-tier terminal tables.

pub mod format;

pub use format::*;
