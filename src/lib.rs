//! # ident-graph
//!
//! An in-memory store for mass-spectrometry identification results.
//!
//! Search engines report peptides, small-molecule compounds and
//! oligonucleotides matched to spectra, together with the proteins or RNAs
//! they map onto, the software that ran and the scores it assigned. These
//! records refer to each other heavily. `ident-graph` keeps them as a typed
//! cross-reference graph in which no reference can dangle.
//!
//! ## Features
//!
//! - **Deduplication**: Registering the same entity twice returns the same handle
//! - **Validated references**: Registration fails if an embedded handle does not resolve
//! - **Provenance**: Results are attributed to the processing step that produced them
//! - **Best match per query**: Under either score orientation
//! - **Sequence coverage**: Parent coverage from positional matches
//! - **Cascading cleanup**: Filtering that keeps the whole graph consistent
//!
//! ## Example
//!
//! ```rust
//! use ident_graph::core::molecule::{IdentifiedPeptide, ParentMatch, ParentMolecule};
//! use ident_graph::core::types::MoleculeType;
//! use ident_graph::{CleanupConfig, IdentificationData};
//!
//! let mut data = IdentificationData::new();
//! let protein = data
//!     .register_parent_molecule(
//!         ParentMolecule::new("P12345", MoleculeType::Protein).with_sequence("MKPEPTIDER"),
//!     )
//!     .unwrap();
//! data.register_identified_peptide(
//!     IdentifiedPeptide::new("PEPTIDE").with_parent_match(protein, ParentMatch::new(2, 8)),
//! )
//! .unwrap();
//!
//! data.calculate_coverages(true);
//! assert!((data.parent_molecules().get(protein).unwrap().coverage - 0.7).abs() < 1e-9);
//!
//! // Nothing matched a spectrum, so everything goes
//! let report = data.cleanup(&CleanupConfig::default());
//! assert_eq!(report.peptides_removed, 1);
//! assert!(data.parent_molecules().is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`registry`]: Identity-keyed storage and handles
//! - [`core`]: Entity types of the identification graph
//! - [`identification`]: The validating store
//! - [`analysis`]: Best match, coverage and cleanup passes
//! - [`utils`]: Validation errors and residue counting
//! - [`cli`]: Command-line interface implementation

pub mod analysis;
pub mod cli;
pub mod core;
pub mod identification;
pub mod registry;
pub mod utils;

// Re-export commonly used types for convenience
pub use analysis::{CleanupConfig, CleanupReport, CoverageConfig};
pub use identification::{IdentificationData, RegistryCounts};
pub use registry::{Handle, Registry};
pub use utils::validation::ValidationError;
