//! `admit-tiers` library crate.
//!
//! The binary (`admit`) is a thin wrapper around this library so that:
//!
//! - the tiering engine is testable without spawning processes
//! - row sources and exports are reusable from other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod report;
pub mod tiering;
