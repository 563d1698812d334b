//! Whole-store passes over registered identifications.
//!
//! - [`best_match`]: best-scoring match per data query
//! - [`coverage`]: parent molecule sequence coverage
//! - [`cleanup`]: cascading removal of disconnected entities

pub mod best_match;
pub mod cleanup;
pub mod coverage;

pub use cleanup::{CleanupConfig, CleanupReport};
pub use coverage::CoverageConfig;
