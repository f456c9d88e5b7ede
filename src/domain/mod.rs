//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - loosely-typed upstream records (`Cell`, `RawRecord`) and validated rows
//! - per-school summaries, tiers, and scored results
//! - candidate profile, query constraints, and run configuration

pub mod types;

pub use types::*;
