//! Entity types of the identification graph.
//!
//! Every entity that other entities point to is stored in a registry and
//! referenced through a [`Handle`](crate::registry::Handle), never copied:
//!
//! - [`provenance`]: input files, software, search parameters, processing steps
//! - [`score`]: score types, score lists and the scored-result mixin
//! - [`molecule`]: parent molecules, identified peptides/oligos/compounds,
//!   positional parent matches and parent-molecule groups
//! - [`query`]: data queries, query matches and query-match groups
//! - [`types`]: shared enums ([`MoleculeType`](types::MoleculeType), ...)
//!
//! ## Reference order
//!
//! | Entity | May reference |
//! |--------|---------------|
//! | DataProcessingStep | Software, InputFile |
//! | ScoreType | Software |
//! | DataQuery | InputFile |
//! | IdentifiedPeptide / IdentifiedOligo | ParentMolecule |
//! | ParentMoleculeGroup | ParentMolecule |
//! | MoleculeQueryMatch | DataQuery, identified molecule |
//! | QueryMatchGroup | MoleculeQueryMatch |

pub mod molecule;
pub mod provenance;
pub mod query;
pub mod score;
pub mod types;
