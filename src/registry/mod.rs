//! Identity-keyed entity storage.
//!
//! A [`Registry`] stores one entity type in an append-only arena and
//! deduplicates registrations by an identity key. Every insertion returns a
//! [`Handle`], a small `Copy` value that other entities embed as a foreign
//! key. Handles are tagged with the issuing registry, so validation is a
//! membership check rather than a pointer comparison.
//!
//! ## Example
//!
//! ```rust
//! use ident_graph::registry::{Identified, Registry};
//!
//! #[derive(Debug)]
//! struct Accession(String);
//!
//! impl Identified for Accession {
//!     type Key = String;
//!     fn identity_key(&self) -> String {
//!         self.0.clone()
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! let (a, inserted) = registry.insert_or_get(Accession("P12345".into()));
//! let (b, again) = registry.insert_or_get(Accession("P12345".into()));
//! assert!(inserted && !again);
//! assert_eq!(a, b);
//! assert!(registry.is_valid(a));
//! ```

pub mod handle;
pub mod store;

pub use handle::{Handle, RegistryTag};
pub use store::{Identified, KeyUpdate, Registry};
