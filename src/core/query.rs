use std::collections::BTreeSet;

use crate::core::molecule::{IdentifiedCompound, IdentifiedOligo, IdentifiedPeptide};
use crate::core::provenance::InputFile;
use crate::core::score::{impl_scored, ScoredProcessingResult};
use crate::core::types::MoleculeType;
use crate::registry::{Handle, Identified};

/// A measurement (spectrum or feature) that identifications are made for
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
    /// Spectrum native ID or feature ID (required)
    pub data_id: String,

    pub input_file: Option<Handle<InputFile>>,

    /// Retention time in seconds
    pub rt: Option<f64>,

    /// Precursor mass-to-charge ratio
    pub mz: Option<f64>,
}

impl DataQuery {
    pub fn new(data_id: impl Into<String>) -> Self {
        Self {
            data_id: data_id.into(),
            input_file: None,
            rt: None,
            mz: None,
        }
    }

    #[must_use]
    pub fn with_input_file(mut self, input_file: Handle<InputFile>) -> Self {
        self.input_file = Some(input_file);
        self
    }

    #[must_use]
    pub fn with_rt_mz(mut self, rt: f64, mz: f64) -> Self {
        self.rt = Some(rt);
        self.mz = Some(mz);
        self
    }
}

impl Identified for DataQuery {
    type Key = (Option<Handle<InputFile>>, String);

    fn identity_key(&self) -> Self::Key {
        (self.input_file, self.data_id.clone())
    }
}

/// Reference to an identified molecule of any family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentifiedMoleculeRef {
    Peptide(Handle<IdentifiedPeptide>),
    Compound(Handle<IdentifiedCompound>),
    Oligo(Handle<IdentifiedOligo>),
}

impl IdentifiedMoleculeRef {
    pub fn molecule_type(&self) -> MoleculeType {
        match self {
            Self::Peptide(_) => MoleculeType::Protein,
            Self::Compound(_) => MoleculeType::Compound,
            Self::Oligo(_) => MoleculeType::Rna,
        }
    }

    pub fn as_peptide(&self) -> Option<Handle<IdentifiedPeptide>> {
        match self {
            Self::Peptide(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<Handle<IdentifiedCompound>> {
        match self {
            Self::Compound(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_oligo(&self) -> Option<Handle<IdentifiedOligo>> {
        match self {
            Self::Oligo(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<Handle<IdentifiedPeptide>> for IdentifiedMoleculeRef {
    fn from(handle: Handle<IdentifiedPeptide>) -> Self {
        Self::Peptide(handle)
    }
}

impl From<Handle<IdentifiedCompound>> for IdentifiedMoleculeRef {
    fn from(handle: Handle<IdentifiedCompound>) -> Self {
        Self::Compound(handle)
    }
}

impl From<Handle<IdentifiedOligo>> for IdentifiedMoleculeRef {
    fn from(handle: Handle<IdentifiedOligo>) -> Self {
        Self::Oligo(handle)
    }
}

/// Association of a data query with a molecule identified from it
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeQueryMatch {
    pub identified_molecule: IdentifiedMoleculeRef,

    pub data_query: Handle<DataQuery>,

    pub charge: i32,

    pub result: ScoredProcessingResult,
}

impl MoleculeQueryMatch {
    pub fn new(
        identified_molecule: impl Into<IdentifiedMoleculeRef>,
        data_query: Handle<DataQuery>,
    ) -> Self {
        Self {
            identified_molecule: identified_molecule.into(),
            data_query,
            charge: 0,
            result: ScoredProcessingResult::default(),
        }
    }

    #[must_use]
    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = charge;
        self
    }

    pub fn molecule_type(&self) -> MoleculeType {
        self.identified_molecule.molecule_type()
    }
}

impl Identified for MoleculeQueryMatch {
    type Key = (IdentifiedMoleculeRef, Handle<DataQuery>);

    fn identity_key(&self) -> Self::Key {
        (self.identified_molecule, self.data_query)
    }
}

/// A set of query matches scored together (e.g. cross-linked spectra)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryMatchGroup {
    pub query_matches: BTreeSet<Handle<MoleculeQueryMatch>>,

    pub result: ScoredProcessingResult,
}

impl QueryMatchGroup {
    pub fn new(query_matches: impl IntoIterator<Item = Handle<MoleculeQueryMatch>>) -> Self {
        Self {
            query_matches: query_matches.into_iter().collect(),
            result: ScoredProcessingResult::default(),
        }
    }
}

impl Identified for QueryMatchGroup {
    type Key = BTreeSet<Handle<MoleculeQueryMatch>>;

    fn identity_key(&self) -> Self::Key {
        self.query_matches.clone()
    }
}

impl_scored!(MoleculeQueryMatch, QueryMatchGroup);
