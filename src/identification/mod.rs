//! The identification store.
//!
//! [`IdentificationData`] owns one [`Registry`] per entity type and is the
//! only way to create, modify or remove entities. Registration validates
//! every embedded handle against the registry it must belong to, so the
//! cross-reference graph never contains a dangling edge except transiently
//! inside cleanup.
//!
//! ## Example
//!
//! ```rust
//! use ident_graph::core::molecule::{IdentifiedPeptide, ParentMatch, ParentMolecule};
//! use ident_graph::core::query::{DataQuery, MoleculeQueryMatch};
//! use ident_graph::core::score::ScoreType;
//! use ident_graph::core::types::MoleculeType;
//! use ident_graph::IdentificationData;
//!
//! let mut data = IdentificationData::new();
//! let protein = data
//!     .register_parent_molecule(
//!         ParentMolecule::new("P12345", MoleculeType::Protein).with_sequence("MKPEPTIDER"),
//!     )
//!     .unwrap();
//! let peptide = data
//!     .register_identified_peptide(
//!         IdentifiedPeptide::new("PEPTIDE").with_parent_match(protein, ParentMatch::new(2, 8)),
//!     )
//!     .unwrap();
//! let query = data.register_data_query(DataQuery::new("scan=42")).unwrap();
//! let matched = data
//!     .register_molecule_query_match(MoleculeQueryMatch::new(peptide, query))
//!     .unwrap();
//! let score = data.register_score_type(ScoreType::new("q-value", false)).unwrap();
//! data.add_score(matched, score, 0.01).unwrap();
//!
//! assert_eq!(data.best_match_per_query(score), vec![matched]);
//! ```

mod register;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::molecule::{
    IdentifiedCompound, IdentifiedOligo, IdentifiedPeptide, ParentMolecule, ParentMoleculeGroup,
};
use crate::core::provenance::{DBSearchParam, DataProcessingStep, InputFile, Software};
use crate::core::query::{DataQuery, MoleculeQueryMatch, QueryMatchGroup};
use crate::core::score::ScoreType;
use crate::registry::{Handle, Registry};
use crate::utils::validation::{require_reference, ValidationError};

/// In-memory, referentially consistent store of identification results
#[derive(Debug, Default)]
pub struct IdentificationData {
    pub(crate) input_files: Registry<InputFile>,
    pub(crate) software: Registry<Software>,
    pub(crate) search_params: Registry<DBSearchParam>,
    pub(crate) processing_steps: Registry<DataProcessingStep>,

    /// Steps that were database searches, with their parameters
    pub(crate) search_steps: BTreeMap<Handle<DataProcessingStep>, Handle<DBSearchParam>>,

    pub(crate) score_types: Registry<ScoreType>,
    pub(crate) data_queries: Registry<DataQuery>,
    pub(crate) parent_molecules: Registry<ParentMolecule>,
    pub(crate) parent_groups: Registry<ParentMoleculeGroup>,
    pub(crate) peptides: Registry<IdentifiedPeptide>,
    pub(crate) compounds: Registry<IdentifiedCompound>,
    pub(crate) oligos: Registry<IdentifiedOligo>,
    pub(crate) query_matches: Registry<MoleculeQueryMatch>,
    pub(crate) match_groups: Registry<QueryMatchGroup>,

    /// Step attributed to newly registered score types and results
    pub(crate) current_step: Option<Handle<DataProcessingStep>>,
}

/// Number of live entities per registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RegistryCounts {
    pub input_files: usize,
    pub software: usize,
    pub search_params: usize,
    pub processing_steps: usize,
    pub score_types: usize,
    pub data_queries: usize,
    pub parent_molecules: usize,
    pub parent_groups: usize,
    pub peptides: usize,
    pub compounds: usize,
    pub oligos: usize,
    pub query_matches: usize,
    pub match_groups: usize,
}

impl IdentificationData {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the processing step that new score types and results are
    /// attributed to.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingReference` if the step is not registered.
    pub fn set_current_processing_step(
        &mut self,
        step: Handle<DataProcessingStep>,
    ) -> Result<(), ValidationError> {
        require_reference(
            self.processing_steps.is_valid(step),
            "a data processing step",
        )?;
        self.current_step = Some(step);
        Ok(())
    }

    /// The active processing step, if any
    pub fn current_processing_step(&self) -> Option<Handle<DataProcessingStep>> {
        self.current_step
    }

    pub fn clear_current_processing_step(&mut self) {
        self.current_step = None;
    }

    /// Run `f` with `step` as the current processing step, then restore
    /// whatever step was active before.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingReference` if the step is not
    /// registered; `f` is not run in that case.
    pub fn with_processing_step<R>(
        &mut self,
        step: Handle<DataProcessingStep>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> Result<R, ValidationError> {
        let previous = self.current_step;
        self.set_current_processing_step(step)?;
        let outcome = f(self);
        self.current_step = previous;
        Ok(outcome)
    }

    /// Search parameters recorded for a database-search step
    pub fn search_param_for_step(
        &self,
        step: Handle<DataProcessingStep>,
    ) -> Option<Handle<DBSearchParam>> {
        self.search_steps.get(&step).copied()
    }

    pub fn input_files(&self) -> &Registry<InputFile> {
        &self.input_files
    }

    pub fn software(&self) -> &Registry<Software> {
        &self.software
    }

    pub fn search_params(&self) -> &Registry<DBSearchParam> {
        &self.search_params
    }

    pub fn processing_steps(&self) -> &Registry<DataProcessingStep> {
        &self.processing_steps
    }

    pub fn score_types(&self) -> &Registry<ScoreType> {
        &self.score_types
    }

    pub fn data_queries(&self) -> &Registry<DataQuery> {
        &self.data_queries
    }

    pub fn parent_molecules(&self) -> &Registry<ParentMolecule> {
        &self.parent_molecules
    }

    pub fn parent_molecule_groups(&self) -> &Registry<ParentMoleculeGroup> {
        &self.parent_groups
    }

    pub fn identified_peptides(&self) -> &Registry<IdentifiedPeptide> {
        &self.peptides
    }

    pub fn identified_compounds(&self) -> &Registry<IdentifiedCompound> {
        &self.compounds
    }

    pub fn identified_oligos(&self) -> &Registry<IdentifiedOligo> {
        &self.oligos
    }

    pub fn query_matches(&self) -> &Registry<MoleculeQueryMatch> {
        &self.query_matches
    }

    pub fn query_match_groups(&self) -> &Registry<QueryMatchGroup> {
        &self.match_groups
    }

    /// Live entity counts for every registry
    pub fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            input_files: self.input_files.len(),
            software: self.software.len(),
            search_params: self.search_params.len(),
            processing_steps: self.processing_steps.len(),
            score_types: self.score_types.len(),
            data_queries: self.data_queries.len(),
            parent_molecules: self.parent_molecules.len(),
            parent_groups: self.parent_groups.len(),
            peptides: self.peptides.len(),
            compounds: self.compounds.len(),
            oligos: self.oligos.len(),
            query_matches: self.query_matches.len(),
            match_groups: self.match_groups.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::score::ScoreType;

    fn store_with_step() -> (IdentificationData, Handle<DataProcessingStep>, Handle<Software>) {
        let mut data = IdentificationData::new();
        let software = data
            .register_data_processing_software(Software::new("Sage", "0.14"))
            .unwrap();
        let step = data
            .register_data_processing_step(DataProcessingStep::new(software))
            .unwrap();
        (data, step, software)
    }

    #[test]
    fn test_current_step_set_and_clear() {
        let (mut data, step, _) = store_with_step();
        assert_eq!(data.current_processing_step(), None);

        data.set_current_processing_step(step).unwrap();
        assert_eq!(data.current_processing_step(), Some(step));

        data.clear_current_processing_step();
        assert_eq!(data.current_processing_step(), None);
    }

    #[test]
    fn test_set_current_step_rejects_foreign_handle() {
        let (mut data, _, _) = store_with_step();
        let (other, foreign_step, _) = store_with_step();
        drop(other);

        let err = data.set_current_processing_step(foreign_step).unwrap_err();
        assert!(matches!(err, ValidationError::DanglingReference { .. }));
        assert_eq!(data.current_processing_step(), None);
    }

    #[test]
    fn test_with_processing_step_restores_previous() {
        let (mut data, step, software) = store_with_step();

        let score = data
            .with_processing_step(step, |data| {
                assert_eq!(data.current_processing_step(), Some(step));
                data.register_score_type(ScoreType::new("hyperscore", true))
            })
            .unwrap()
            .unwrap();

        assert_eq!(data.current_processing_step(), None);
        let registered = data.score_types().get(score).unwrap();
        assert_eq!(registered.software, Some(software));
    }

    #[test]
    fn test_counts_start_empty() {
        let data = IdentificationData::new();
        assert_eq!(data.counts(), RegistryCounts::default());
    }
}
