//! Shared helpers: registration checks and sequence length resolution.

pub mod sequence;
pub mod validation;
