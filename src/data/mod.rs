//! Row sources and synthetic data.
//!
//! - the `RowSource` boundary and shared query filters (`source`)
//! - tabular-query service over HTTP (`http`)
//! - seeded synthetic admissions tables (`sample`)

pub mod http;
pub mod sample;
pub mod source;

pub use http::HttpRowSource;
pub use sample::{SampleConfig, SampleRow, generate_rows, generate_sample};
pub use source::RowSource;
