//! JSON batch documents replayed through the registration API.
//!
//! A batch lists entities in registration order. References between
//! entities are zero-based positions into an earlier list of the same
//! document, e.g. `"parent": 0` names the first entry of
//! `parent_molecules`.
//!
//! ```json
//! {
//!   "software": [{"name": "Sage", "version": "0.14"}],
//!   "processing_steps": [{"software": 0, "actions": ["identification"]}],
//!   "score_types": [{"name": "q-value", "higher_better": false, "step": 0}],
//!   "parent_molecules": [{"accession": "P1", "sequence": "MPEPTIDEK"}],
//!   "peptides": [
//!     {"sequence": "PEPTIDE", "parent_matches": [{"parent": 0, "start": 1, "end": 7}]}
//!   ],
//!   "data_queries": [{"data_id": "scan=1"}],
//!   "query_matches": [{"peptide": 0, "query": 0, "scores": [{"score_type": 0, "value": 0.01}]}]
//! }
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::analysis::{CleanupConfig, CoverageConfig};
use crate::core::molecule::{
    IdentifiedCompound, IdentifiedOligo, IdentifiedPeptide, ParentMatch, ParentMatches,
    ParentMolecule, ParentMoleculeGroup, UNKNOWN_NEIGHBOR,
};
use crate::core::provenance::{DBSearchParam, DataProcessingStep, InputFile, Software};
use crate::core::query::{DataQuery, IdentifiedMoleculeRef, MoleculeQueryMatch, QueryMatchGroup};
use crate::core::score::{ScoreType, ScoredProcessingResult};
use crate::core::types::{MoleculeType, ProcessingAction};
use crate::identification::IdentificationData;
use crate::registry::Handle;
use crate::utils::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Failed to read batch: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse batch: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("{list}[{index}] refers to {target}[{position}], which does not exist")]
    UnknownReference {
        list: &'static str,
        index: usize,
        target: &'static str,
        position: usize,
    },

    #[error("query_matches[{index}] must name exactly one of peptide, compound or oligo")]
    AmbiguousMolecule { index: usize },

    #[error("{list}[{index}] was rejected: {source}")]
    Rejected {
        list: &'static str,
        index: usize,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SoftwareRecord {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepRecord {
    pub software: usize,
    #[serde(default)]
    pub input_files: Vec<usize>,
    #[serde(default)]
    pub primary_files: Vec<String>,
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: Vec<ProcessingAction>,
    /// Position in `search_params` if the step was a database search
    pub search_param: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreTypeRecord {
    pub name: String,
    pub higher_better: bool,
    pub software: Option<usize>,
    /// Register while this processing step is current
    pub step: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScoreRecord {
    pub score_type: usize,
    pub value: f64,
}

/// Scores and processing steps shared by all scored records
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoredRecord {
    pub scores: Vec<ScoreRecord>,
    pub processing_steps: Vec<usize>,
    /// Register while this processing step is current
    pub step: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentRecord {
    pub accession: String,
    #[serde(default = "default_molecule_type")]
    pub molecule_type: MoleculeType,
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_decoy: bool,
    #[serde(flatten)]
    pub scored: ScoredRecord,
}

fn default_molecule_type() -> MoleculeType {
    MoleculeType::Protein
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentMatchRecord {
    pub parent: usize,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub left_neighbor: Option<char>,
    pub right_neighbor: Option<char>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SequenceRecord {
    pub sequence: String,
    #[serde(default)]
    pub parent_matches: Vec<ParentMatchRecord>,
    #[serde(flatten)]
    pub scored: ScoredRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompoundRecord {
    pub identifier: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub smile: String,
    #[serde(default)]
    pub inchi: String,
    #[serde(flatten)]
    pub scored: ScoredRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryRecord {
    pub data_id: String,
    pub input_file: Option<usize>,
    pub rt: Option<f64>,
    pub mz: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryMatchRecord {
    pub peptide: Option<usize>,
    pub compound: Option<usize>,
    pub oligo: Option<usize>,
    pub query: usize,
    #[serde(default)]
    pub charge: i32,
    #[serde(flatten)]
    pub scored: ScoredRecord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupRecord {
    pub members: Vec<usize>,
    #[serde(flatten)]
    pub scored: ScoredRecord,
}

/// A complete batch document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Batch {
    pub input_files: Vec<String>,
    pub software: Vec<SoftwareRecord>,
    pub search_params: Vec<DBSearchParam>,
    pub processing_steps: Vec<StepRecord>,
    pub score_types: Vec<ScoreTypeRecord>,
    pub parent_molecules: Vec<ParentRecord>,
    pub parent_groups: Vec<GroupRecord>,
    pub peptides: Vec<SequenceRecord>,
    pub compounds: Vec<CompoundRecord>,
    pub oligos: Vec<SequenceRecord>,
    pub data_queries: Vec<QueryRecord>,
    pub query_matches: Vec<QueryMatchRecord>,
    pub match_groups: Vec<GroupRecord>,

    /// Cleanup settings used by the `cleanup` command
    pub cleanup: CleanupConfig,
    /// Coverage settings used by the `coverage` command
    pub coverage: CoverageConfig,
}

/// A registered batch: the store plus the handle of every record
#[derive(Debug, Default)]
pub struct Replay {
    pub data: IdentificationData,
    pub score_types: Vec<Handle<ScoreType>>,
    pub parent_molecules: Vec<Handle<ParentMolecule>>,
    pub data_queries: Vec<Handle<DataQuery>>,
    pub query_matches: Vec<Handle<MoleculeQueryMatch>>,
    software: Vec<Handle<Software>>,
}

impl Replay {
    /// Software handle registered under `name`, first match in batch order
    pub fn software_named(&self, name: &str) -> Option<Handle<Software>> {
        self.software.iter().copied().find(|&handle| {
            self.data
                .software()
                .get(handle)
                .is_some_and(|software| software.name == name)
        })
    }
}

/// Resolve `position` in an earlier list of handles
fn lookup<T>(
    handles: &[Handle<T>],
    list: &'static str,
    index: usize,
    target: &'static str,
    position: usize,
) -> Result<Handle<T>, BatchError> {
    handles
        .get(position)
        .copied()
        .ok_or(BatchError::UnknownReference {
            list,
            index,
            target,
            position,
        })
}

fn rejected(list: &'static str, index: usize) -> impl FnOnce(ValidationError) -> BatchError {
    move |source| BatchError::Rejected {
        list,
        index,
        source,
    }
}

/// Handles registered so far, used to resolve record positions
#[derive(Default)]
struct Resolver {
    input_files: Vec<Handle<InputFile>>,
    software: Vec<Handle<Software>>,
    search_params: Vec<Handle<DBSearchParam>>,
    steps: Vec<Handle<DataProcessingStep>>,
    score_types: Vec<Handle<ScoreType>>,
    parents: Vec<Handle<ParentMolecule>>,
    peptides: Vec<Handle<IdentifiedPeptide>>,
    compounds: Vec<Handle<IdentifiedCompound>>,
    oligos: Vec<Handle<IdentifiedOligo>>,
    queries: Vec<Handle<DataQuery>>,
    matches: Vec<Handle<MoleculeQueryMatch>>,
}

impl Resolver {
    fn scored(
        &self,
        record: &ScoredRecord,
        list: &'static str,
        index: usize,
    ) -> Result<ScoredProcessingResult, BatchError> {
        let mut result = ScoredProcessingResult::default();
        for score in &record.scores {
            let score_type =
                lookup(&self.score_types, list, index, "score_types", score.score_type)?;
            result.scores.set(score_type, score.value);
        }
        for &step in &record.processing_steps {
            let step = lookup(&self.steps, list, index, "processing_steps", step)?;
            result.add_processing_step(step);
        }
        Ok(result)
    }

    fn step(
        &self,
        step: Option<usize>,
        list: &'static str,
        index: usize,
    ) -> Result<Option<Handle<DataProcessingStep>>, BatchError> {
        step.map(|step| lookup(&self.steps, list, index, "processing_steps", step))
            .transpose()
    }

    fn parent_matches(
        &self,
        records: &[ParentMatchRecord],
        list: &'static str,
        index: usize,
    ) -> Result<ParentMatches, BatchError> {
        let mut matches = ParentMatches::new();
        for record in records {
            let parent = lookup(&self.parents, list, index, "parent_molecules", record.parent)?;
            let position = ParentMatch {
                start: record.start,
                end: record.end,
                left_neighbor: record.left_neighbor.unwrap_or(UNKNOWN_NEIGHBOR),
                right_neighbor: record.right_neighbor.unwrap_or(UNKNOWN_NEIGHBOR),
            };
            matches.entry(parent).or_default().insert(position);
        }
        Ok(matches)
    }
}

/// Register `item` with `step` as the current processing step, if given
fn register_in_step<T>(
    data: &mut IdentificationData,
    step: Option<Handle<DataProcessingStep>>,
    register: impl FnOnce(&mut IdentificationData) -> Result<T, ValidationError>,
) -> Result<T, ValidationError> {
    match step {
        Some(step) => data.with_processing_step(step, register)?,
        None => register(data),
    }
}

impl Batch {
    /// Parse a batch from a JSON string
    pub fn from_json(json: &str) -> Result<Self, BatchError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a batch from a JSON file
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Register every record, in document order.
    ///
    /// # Errors
    ///
    /// Fails on the first record that refers to a missing position or that
    /// the store rejects.
    #[allow(clippy::too_many_lines)]
    pub fn replay(&self) -> Result<Replay, BatchError> {
        let mut data = IdentificationData::new();
        let mut r = Resolver::default();

        for (index, name) in self.input_files.iter().enumerate() {
            let handle = data
                .register_input_file(name.as_str())
                .map_err(rejected("input_files", index))?;
            r.input_files.push(handle);
        }

        for (index, record) in self.software.iter().enumerate() {
            let handle = data
                .register_data_processing_software(Software::new(&record.name, &record.version))
                .map_err(rejected("software", index))?;
            r.software.push(handle);
        }

        for param in &self.search_params {
            r.search_params.push(data.register_db_search_param(param.clone()));
        }

        for (index, record) in self.processing_steps.iter().enumerate() {
            let list = "processing_steps";
            let software = lookup(&r.software, list, index, "software", record.software)?;
            let input_files = record
                .input_files
                .iter()
                .map(|&file| lookup(&r.input_files, list, index, "input_files", file))
                .collect::<Result<Vec<_>, _>>()?;
            let mut step = DataProcessingStep::new(software)
                .with_input_files(input_files)
                .with_primary_files(record.primary_files.clone());
            step.date_time = record.date_time;
            step.actions.extend(record.actions.iter().copied());

            let handle = match record.search_param {
                Some(param) => {
                    let param = lookup(&r.search_params, list, index, "search_params", param)?;
                    data.register_data_processing_step_with_search_param(step, param)
                }
                None => data.register_data_processing_step(step),
            }
            .map_err(rejected(list, index))?;
            r.steps.push(handle);
        }

        for (index, record) in self.score_types.iter().enumerate() {
            let list = "score_types";
            let mut score_type = ScoreType::new(&record.name, record.higher_better);
            if let Some(software) = record.software {
                let software = lookup(&r.software, list, index, "software", software)?;
                score_type = score_type.with_software(software);
            }
            let step = r.step(record.step, list, index)?;
            let handle =
                register_in_step(&mut data, step, |data| data.register_score_type(score_type))
                    .map_err(rejected(list, index))?;
            r.score_types.push(handle);
        }

        for (index, record) in self.parent_molecules.iter().enumerate() {
            let list = "parent_molecules";
            let mut parent = ParentMolecule::new(&record.accession, record.molecule_type)
                .with_sequence(&record.sequence)
                .with_description(&record.description)
                .with_decoy(record.is_decoy);
            parent.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            let handle =
                register_in_step(&mut data, step, |data| data.register_parent_molecule(parent))
                    .map_err(rejected(list, index))?;
            r.parents.push(handle);
        }

        for (index, record) in self.parent_groups.iter().enumerate() {
            let list = "parent_groups";
            let members = record
                .members
                .iter()
                .map(|&m| lookup(&r.parents, list, index, "parent_molecules", m))
                .collect::<Result<Vec<_>, _>>()?;
            let mut group = ParentMoleculeGroup::new(members);
            group.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            register_in_step(&mut data, step, |data| {
                data.register_parent_molecule_group(group)
            })
            .map_err(rejected(list, index))?;
        }

        for (index, record) in self.peptides.iter().enumerate() {
            let list = "peptides";
            let mut peptide = IdentifiedPeptide::new(&record.sequence);
            peptide.parent_matches = r.parent_matches(&record.parent_matches, list, index)?;
            peptide.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            let handle = register_in_step(&mut data, step, |data| {
                data.register_identified_peptide(peptide)
            })
            .map_err(rejected(list, index))?;
            r.peptides.push(handle);
        }

        for (index, record) in self.compounds.iter().enumerate() {
            let list = "compounds";
            let mut compound = IdentifiedCompound::new(&record.identifier)
                .with_formula(&record.formula)
                .with_name(&record.name);
            compound.smile.clone_from(&record.smile);
            compound.inchi.clone_from(&record.inchi);
            compound.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            let handle = register_in_step(&mut data, step, |data| {
                data.register_identified_compound(compound)
            })
            .map_err(rejected(list, index))?;
            r.compounds.push(handle);
        }

        for (index, record) in self.oligos.iter().enumerate() {
            let list = "oligos";
            let mut oligo = IdentifiedOligo::new(&record.sequence);
            oligo.parent_matches = r.parent_matches(&record.parent_matches, list, index)?;
            oligo.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            let handle =
                register_in_step(&mut data, step, |data| data.register_identified_oligo(oligo))
                    .map_err(rejected(list, index))?;
            r.oligos.push(handle);
        }

        for (index, record) in self.data_queries.iter().enumerate() {
            let list = "data_queries";
            let mut query = DataQuery::new(&record.data_id);
            if let Some(file) = record.input_file {
                let file = lookup(&r.input_files, list, index, "input_files", file)?;
                query = query.with_input_file(file);
            }
            query.rt = record.rt;
            query.mz = record.mz;
            let handle = data
                .register_data_query(query)
                .map_err(rejected(list, index))?;
            r.queries.push(handle);
        }

        for (index, record) in self.query_matches.iter().enumerate() {
            let list = "query_matches";
            let molecule: IdentifiedMoleculeRef =
                match (record.peptide, record.compound, record.oligo) {
                    (Some(p), None, None) => {
                        lookup(&r.peptides, list, index, "peptides", p)?.into()
                    }
                    (None, Some(c), None) => {
                        lookup(&r.compounds, list, index, "compounds", c)?.into()
                    }
                    (None, None, Some(o)) => lookup(&r.oligos, list, index, "oligos", o)?.into(),
                    _ => return Err(BatchError::AmbiguousMolecule { index }),
                };
            let query = lookup(&r.queries, list, index, "data_queries", record.query)?;
            let mut query_match =
                MoleculeQueryMatch::new(molecule, query).with_charge(record.charge);
            query_match.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            let handle = register_in_step(&mut data, step, |data| {
                data.register_molecule_query_match(query_match)
            })
            .map_err(rejected(list, index))?;
            r.matches.push(handle);
        }

        for (index, record) in self.match_groups.iter().enumerate() {
            let list = "match_groups";
            let members = record
                .members
                .iter()
                .map(|&m| lookup(&r.matches, list, index, "query_matches", m))
                .collect::<Result<Vec<_>, _>>()?;
            let mut group = QueryMatchGroup::new(members);
            group.result = r.scored(&record.scored, list, index)?;
            let step = r.step(record.scored.step, list, index)?;
            register_in_step(&mut data, step, |data| {
                data.register_query_match_group(group)
            })
            .map_err(rejected(list, index))?;
        }

        debug!("replayed batch: {:?}", data.counts());
        Ok(Replay {
            data,
            score_types: r.score_types,
            parent_molecules: r.parents,
            data_queries: r.queries,
            query_matches: r.matches,
            software: r.software,
        })
    }
}

/// Label of an identified molecule for display
pub fn molecule_label(data: &IdentificationData, molecule: IdentifiedMoleculeRef) -> String {
    let label = match molecule {
        IdentifiedMoleculeRef::Peptide(h) => data.identified_peptides().get(h).map(|p| &p.sequence),
        IdentifiedMoleculeRef::Compound(h) => {
            data.identified_compounds().get(h).map(|c| &c.identifier)
        }
        IdentifiedMoleculeRef::Oligo(h) => data.identified_oligos().get(h).map(|o| &o.sequence),
    };
    label.cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = r#"{
        "input_files": ["run1.mzML"],
        "software": [{"name": "Sage", "version": "0.14"}],
        "search_params": [{"database": "human.fasta", "digestion_enzyme": "Trypsin", "missed_cleavages": 2}],
        "processing_steps": [{"software": 0, "input_files": [0], "actions": ["identification"], "search_param": 0}],
        "score_types": [{"name": "q-value", "higher_better": false, "step": 0}],
        "parent_molecules": [{"accession": "P1", "sequence": "MPEPTIDEK"}],
        "peptides": [
            {"sequence": "PEPTIDE", "parent_matches": [{"parent": 0, "start": 1, "end": 7, "left_neighbor": "M", "right_neighbor": "K"}]}
        ],
        "data_queries": [{"data_id": "scan=1", "input_file": 0, "rt": 12.5, "mz": 400.2}],
        "query_matches": [{"peptide": 0, "query": 0, "charge": 2, "scores": [{"score_type": 0, "value": 0.01}], "step": 0}]
    }"#;

    #[test]
    fn test_replay_registers_everything() {
        let batch = Batch::from_json(BATCH).unwrap();
        let replay = batch.replay().unwrap();
        let counts = replay.data.counts();
        assert_eq!(counts.input_files, 1);
        assert_eq!(counts.processing_steps, 1);
        assert_eq!(counts.peptides, 1);
        assert_eq!(counts.query_matches, 1);

        let step = replay.data.processing_steps().handles()[0];
        assert!(replay.data.search_param_for_step(step).is_some());

        let score = replay.score_types[0];
        let software = replay.software_named("Sage").unwrap();
        assert_eq!(replay.data.score_types().get(score).unwrap().software, Some(software));

        let m = replay.data.query_matches().get(replay.query_matches[0]).unwrap();
        assert_eq!(m.result.processing_steps, vec![step]);
        assert_eq!(molecule_label(&replay.data, m.identified_molecule), "PEPTIDE");
    }

    #[test]
    fn test_unknown_position() {
        let json = r#"{"peptides": [{"sequence": "PEP", "parent_matches": [{"parent": 3}]}]}"#;
        let batch = Batch::from_json(json).unwrap();
        let err = batch.replay().unwrap_err();
        assert!(matches!(
            err,
            BatchError::UnknownReference {
                list: "peptides",
                index: 0,
                target: "parent_molecules",
                position: 3
            }
        ));
    }

    #[test]
    fn test_rejected_record() {
        let batch = Batch::from_json(
            r#"{"score_types": [{"name": "s", "higher_better": true}, {"name": "s", "higher_better": false}]}"#,
        )
        .unwrap();
        let err = batch.replay().unwrap_err();
        assert!(err.to_string().starts_with("score_types[1] was rejected"));
    }

    #[test]
    fn test_ambiguous_molecule() {
        let batch = Batch::from_json(
            r#"{"compounds": [{"identifier": "C1"}], "peptides": [{"sequence": "PEP"}],
                "data_queries": [{"data_id": "q"}],
                "query_matches": [{"peptide": 0, "compound": 0, "query": 0}]}"#,
        )
        .unwrap();
        assert!(matches!(
            batch.replay().unwrap_err(),
            BatchError::AmbiguousMolecule { index: 0 }
        ));
    }

    #[test]
    fn test_batch_configs_default() {
        let batch = Batch::from_json("{}").unwrap();
        assert_eq!(batch.cleanup, CleanupConfig::default());
        assert_eq!(batch.coverage, CoverageConfig::default());
        assert!(Batch::from_json("{not json").is_err());
    }
}
