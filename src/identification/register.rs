use tracing::debug;

use crate::core::molecule::{
    IdentifiedCompound, IdentifiedOligo, IdentifiedPeptide, ParentMatches, ParentMolecule,
    ParentMoleculeGroup, SequenceMolecule,
};
use crate::core::provenance::{DBSearchParam, DataProcessingStep, InputFile, Software};
use crate::core::query::{DataQuery, IdentifiedMoleculeRef, MoleculeQueryMatch, QueryMatchGroup};
use crate::core::score::{ScoreType, Scored, ScoredProcessingResult};
use crate::core::types::MoleculeType;
use crate::registry::{Handle, Identified, Registry};
use crate::utils::validation::{
    require_molecule_type, require_non_empty, require_reference, ValidationError,
};

use super::IdentificationData;

/// Insert a validated scored result, attributing it to the current step if
/// it is new.
fn insert_scored<T>(
    registry: &mut Registry<T>,
    mut item: T,
    current_step: Option<Handle<DataProcessingStep>>,
    kind: &'static str,
) -> Handle<T>
where
    T: Identified + Scored,
{
    if let Some(existing) = registry.find(&item.identity_key()) {
        debug!("{kind} already registered as {existing:?}");
        return existing;
    }
    if let Some(step) = current_step {
        item.result_mut().add_processing_step(step);
    }
    let (handle, _) = registry.insert_or_get(item);
    debug!("registered {kind} {handle:?}");
    handle
}

impl IdentificationData {
    fn check_scored(&self, result: &ScoredProcessingResult) -> Result<(), ValidationError> {
        for (score_type, _) in result.scores.iter() {
            require_reference(self.score_types.is_valid(score_type), "a score type")?;
        }
        for &step in &result.processing_steps {
            require_reference(
                self.processing_steps.is_valid(step),
                "a data processing step",
            )?;
        }
        Ok(())
    }

    fn check_parent_matches(
        &self,
        matches: &ParentMatches,
        expected: MoleculeType,
    ) -> Result<(), ValidationError> {
        for &parent in matches.keys() {
            let Some(molecule) = self.parent_molecules.get(parent) else {
                return Err(ValidationError::DanglingReference {
                    target: "a parent molecule",
                });
            };
            require_molecule_type(molecule.molecule_type, expected, "parent molecule")?;
        }
        Ok(())
    }

    fn check_sequence_molecule<T: SequenceMolecule + Scored>(
        &self,
        molecule: &T,
        entity: &'static str,
    ) -> Result<(), ValidationError> {
        require_non_empty(molecule.sequence(), entity, "sequence")?;
        self.check_parent_matches(molecule.parent_matches(), T::PARENT_TYPE)?;
        self.check_scored(molecule.result())
    }

    /// Register an input file by name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for an empty name.
    pub fn register_input_file(
        &mut self,
        file: impl Into<String>,
    ) -> Result<Handle<InputFile>, ValidationError> {
        let file = InputFile::new(file);
        require_non_empty(&file.name, "input file", "name")?;
        Ok(self.input_files.insert_or_get(file).0)
    }

    /// Register data processing software.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for an empty name.
    pub fn register_data_processing_software(
        &mut self,
        software: Software,
    ) -> Result<Handle<Software>, ValidationError> {
        require_non_empty(&software.name, "data processing software", "name")?;
        Ok(self.software.insert_or_get(software).0)
    }

    pub fn register_db_search_param(&mut self, param: DBSearchParam) -> Handle<DBSearchParam> {
        self.search_params.insert_or_get(param).0
    }

    /// Register a processing step.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingReference` if the software or any
    /// input file is not registered.
    pub fn register_data_processing_step(
        &mut self,
        step: DataProcessingStep,
    ) -> Result<Handle<DataProcessingStep>, ValidationError> {
        self.check_processing_step(&step)?;
        Ok(self.processing_steps.insert_or_get(step).0)
    }

    /// Register a database-search step together with its parameters.
    ///
    /// A step keeps the first parameter set it was registered with.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingReference` if the software, an input
    /// file or the search parameters are not registered.
    pub fn register_data_processing_step_with_search_param(
        &mut self,
        step: DataProcessingStep,
        search_param: Handle<DBSearchParam>,
    ) -> Result<Handle<DataProcessingStep>, ValidationError> {
        self.check_processing_step(&step)?;
        require_reference(
            self.search_params.is_valid(search_param),
            "database search parameters",
        )?;
        let (handle, _) = self.processing_steps.insert_or_get(step);
        self.search_steps.entry(handle).or_insert(search_param);
        Ok(handle)
    }

    fn check_processing_step(&self, step: &DataProcessingStep) -> Result<(), ValidationError> {
        require_reference(
            self.software.is_valid(step.software),
            "data processing software",
        )?;
        for &file in &step.input_files {
            require_reference(self.input_files.is_valid(file), "an input file")?;
        }
        Ok(())
    }

    /// Register a score type.
    ///
    /// Without explicit software, the software of the current processing
    /// step (if any) is attributed.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingReference` for unregistered software
    /// and `ValidationError::OrientationConflict` if a score type of the same
    /// name has the opposite orientation.
    pub fn register_score_type(
        &mut self,
        mut score_type: ScoreType,
    ) -> Result<Handle<ScoreType>, ValidationError> {
        match score_type.software {
            None => {
                score_type.software = self
                    .current_step
                    .and_then(|step| self.processing_steps.get(step))
                    .map(|step| step.software);
            }
            Some(software) => {
                require_reference(self.software.is_valid(software), "data processing software")?;
            }
        }

        let conflict = self.score_types.iter().any(|(_, existing)| {
            existing.name == score_type.name && existing.higher_better != score_type.higher_better
        });
        if conflict {
            return Err(ValidationError::OrientationConflict {
                name: score_type.name,
            });
        }

        Ok(self.score_types.insert_or_get(score_type).0)
    }

    /// Register a data query.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingField` for an empty identifier and
    /// `ValidationError::DanglingReference` for an unregistered input file.
    pub fn register_data_query(
        &mut self,
        query: DataQuery,
    ) -> Result<Handle<DataQuery>, ValidationError> {
        require_non_empty(&query.data_id, "data query", "identifier")?;
        if let Some(file) = query.input_file {
            require_reference(self.input_files.is_valid(file), "an input file")?;
        }
        Ok(self.data_queries.insert_or_get(query).0)
    }

    /// Register an identified peptide.
    ///
    /// # Errors
    ///
    /// Fails on an empty sequence, an unregistered parent, score type or
    /// step, or a parent that is not a protein.
    pub fn register_identified_peptide(
        &mut self,
        peptide: IdentifiedPeptide,
    ) -> Result<Handle<IdentifiedPeptide>, ValidationError> {
        self.check_sequence_molecule(&peptide, "peptide")?;
        Ok(insert_scored(
            &mut self.peptides,
            peptide,
            self.current_step,
            "peptide",
        ))
    }

    /// Register an identified compound.
    ///
    /// # Errors
    ///
    /// Fails on an empty identifier or an unregistered score type or step.
    pub fn register_identified_compound(
        &mut self,
        compound: IdentifiedCompound,
    ) -> Result<Handle<IdentifiedCompound>, ValidationError> {
        require_non_empty(&compound.identifier, "compound", "identifier")?;
        self.check_scored(compound.result())?;
        Ok(insert_scored(
            &mut self.compounds,
            compound,
            self.current_step,
            "compound",
        ))
    }

    /// Register an identified oligonucleotide.
    ///
    /// # Errors
    ///
    /// Fails on an empty sequence, an unregistered parent, score type or
    /// step, or a parent that is not RNA.
    pub fn register_identified_oligo(
        &mut self,
        oligo: IdentifiedOligo,
    ) -> Result<Handle<IdentifiedOligo>, ValidationError> {
        self.check_sequence_molecule(&oligo, "oligonucleotide")?;
        Ok(insert_scored(
            &mut self.oligos,
            oligo,
            self.current_step,
            "oligonucleotide",
        ))
    }

    /// Register a parent molecule.
    ///
    /// # Errors
    ///
    /// Fails on an empty accession or an unregistered score type or step.
    pub fn register_parent_molecule(
        &mut self,
        parent: ParentMolecule,
    ) -> Result<Handle<ParentMolecule>, ValidationError> {
        require_non_empty(&parent.accession, "parent molecule", "accession")?;
        self.check_scored(parent.result())?;
        Ok(insert_scored(
            &mut self.parent_molecules,
            parent,
            self.current_step,
            "parent molecule",
        ))
    }

    /// Register a group of parent molecules.
    ///
    /// # Errors
    ///
    /// Fails if any member, score type or step is not registered.
    pub fn register_parent_molecule_group(
        &mut self,
        group: ParentMoleculeGroup,
    ) -> Result<Handle<ParentMoleculeGroup>, ValidationError> {
        for &parent in &group.parent_molecules {
            require_reference(self.parent_molecules.is_valid(parent), "a parent molecule")?;
        }
        self.check_scored(group.result())?;
        Ok(insert_scored(
            &mut self.parent_groups,
            group,
            self.current_step,
            "parent molecule group",
        ))
    }

    /// Register a match between a data query and an identified molecule.
    ///
    /// # Errors
    ///
    /// Fails if the data query, the identified molecule, a score type or a
    /// step is not registered.
    pub fn register_molecule_query_match(
        &mut self,
        query_match: MoleculeQueryMatch,
    ) -> Result<Handle<MoleculeQueryMatch>, ValidationError> {
        self.check_identified_molecule(query_match.identified_molecule)?;
        require_reference(
            self.data_queries.is_valid(query_match.data_query),
            "a data query",
        )?;
        self.check_scored(query_match.result())?;
        Ok(insert_scored(
            &mut self.query_matches,
            query_match,
            self.current_step,
            "molecule-query match",
        ))
    }

    pub(crate) fn is_valid_molecule(&self, molecule: IdentifiedMoleculeRef) -> bool {
        match molecule {
            IdentifiedMoleculeRef::Peptide(handle) => self.peptides.is_valid(handle),
            IdentifiedMoleculeRef::Compound(handle) => self.compounds.is_valid(handle),
            IdentifiedMoleculeRef::Oligo(handle) => self.oligos.is_valid(handle),
        }
    }

    fn check_identified_molecule(
        &self,
        molecule: IdentifiedMoleculeRef,
    ) -> Result<(), ValidationError> {
        let target = match molecule {
            IdentifiedMoleculeRef::Peptide(_) => "an identified peptide",
            IdentifiedMoleculeRef::Compound(_) => "an identified compound",
            IdentifiedMoleculeRef::Oligo(_) => "an identified oligonucleotide",
        };
        require_reference(self.is_valid_molecule(molecule), target)
    }

    /// Register a group of query matches.
    ///
    /// # Errors
    ///
    /// Fails if any member, score type or step is not registered.
    pub fn register_query_match_group(
        &mut self,
        group: QueryMatchGroup,
    ) -> Result<Handle<QueryMatchGroup>, ValidationError> {
        for &query_match in &group.query_matches {
            require_reference(
                self.query_matches.is_valid(query_match),
                "a molecule-query match",
            )?;
        }
        self.check_scored(group.result())?;
        Ok(insert_scored(
            &mut self.match_groups,
            group,
            self.current_step,
            "query match group",
        ))
    }

    /// Attach a score to a query match, replacing any earlier value of the
    /// same score type.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DanglingReference` if the match or the score
    /// type is not registered.
    pub fn add_score(
        &mut self,
        query_match: Handle<MoleculeQueryMatch>,
        score_type: Handle<ScoreType>,
        value: f64,
    ) -> Result<(), ValidationError> {
        require_reference(self.score_types.is_valid(score_type), "a score type")?;
        let modified = self.query_matches.modify(query_match, |m| {
            m.result.scores.set(score_type, value);
        });
        require_reference(modified, "a molecule-query match")
    }

    /// First score type (in registration order) with the given name and,
    /// if `software` is given, that software.
    pub fn find_score_type(
        &self,
        name: &str,
        software: Option<Handle<Software>>,
    ) -> Option<Handle<ScoreType>> {
        self.score_types
            .iter()
            .find(|(_, score_type)| {
                score_type.name == name
                    && software.map_or(true, |software| score_type.software == Some(software))
            })
            .map(|(handle, _)| handle)
    }
}
