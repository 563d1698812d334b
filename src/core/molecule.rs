use std::collections::{BTreeMap, BTreeSet};

use crate::core::score::{impl_scored, ScoredProcessingResult};
use crate::core::types::MoleculeType;
use crate::registry::{Handle, Identified};

/// Neighbor residue that is not known
pub const UNKNOWN_NEIGHBOR: char = 'X';
/// Neighbor marker for a match at the N-terminus / 5' end of the parent
pub const LEFT_TERMINUS: char = '[';
/// Neighbor marker for a match at the C-terminus / 3' end of the parent
pub const RIGHT_TERMINUS: char = ']';

/// A protein or nucleic acid that identified molecules map onto
#[derive(Debug, Clone, PartialEq)]
pub struct ParentMolecule {
    /// Database accession (required, identity key)
    pub accession: String,

    pub molecule_type: MoleculeType,

    /// Full residue sequence; may be empty if not available
    pub sequence: String,

    pub description: String,

    pub is_decoy: bool,

    /// Fraction of residues covered by identified molecules, set by
    /// coverage calculation
    pub coverage: f64,

    pub result: ScoredProcessingResult,
}

impl ParentMolecule {
    pub fn new(accession: impl Into<String>, molecule_type: MoleculeType) -> Self {
        Self {
            accession: accession.into(),
            molecule_type,
            sequence: String::new(),
            description: String::new(),
            is_decoy: false,
            coverage: 0.0,
            result: ScoredProcessingResult::default(),
        }
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = sequence.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_decoy(mut self, is_decoy: bool) -> Self {
        self.is_decoy = is_decoy;
        self
    }
}

impl Identified for ParentMolecule {
    type Key = String;

    fn identity_key(&self) -> String {
        self.accession.clone()
    }
}

/// Where an identified molecule aligns within a parent molecule.
///
/// Positions are zero-based and inclusive; `None` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentMatch {
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub left_neighbor: char,
    pub right_neighbor: char,
}

impl ParentMatch {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            left_neighbor: UNKNOWN_NEIGHBOR,
            right_neighbor: UNKNOWN_NEIGHBOR,
        }
    }

    /// A match whose location in the parent is not known
    pub fn unknown() -> Self {
        Self {
            start: None,
            end: None,
            left_neighbor: UNKNOWN_NEIGHBOR,
            right_neighbor: UNKNOWN_NEIGHBOR,
        }
    }

    #[must_use]
    pub fn with_neighbors(mut self, left: char, right: char) -> Self {
        self.left_neighbor = left;
        self.right_neighbor = right;
        self
    }

    pub fn is_n_terminal(&self) -> bool {
        self.left_neighbor == LEFT_TERMINUS
    }

    pub fn is_c_terminal(&self) -> bool {
        self.right_neighbor == RIGHT_TERMINUS
    }

    /// Check that both positions are known and consistent.
    ///
    /// A non-zero `molecule_length` must equal the span of the match; a
    /// non-zero `parent_length` must contain the end position.
    pub fn has_valid_positions(&self, molecule_length: usize, parent_length: usize) -> bool {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return false;
        };
        if end < start {
            return false;
        }
        if molecule_length > 0 && end - start + 1 != molecule_length {
            return false;
        }
        if parent_length > 0 && end >= parent_length {
            return false;
        }
        true
    }
}

/// Parent molecules of an identified molecule with the matches into each
pub type ParentMatches = BTreeMap<Handle<ParentMolecule>, BTreeSet<ParentMatch>>;

/// Identified molecules defined by a residue sequence that maps onto parents
pub trait SequenceMolecule {
    /// Molecule type every parent of this kind must have
    const PARENT_TYPE: MoleculeType;

    fn sequence(&self) -> &str;

    fn parent_matches(&self) -> &ParentMatches;

    fn parent_matches_mut(&mut self) -> &mut ParentMatches;
}

/// A peptide identified from one or more data queries
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedPeptide {
    /// Residue sequence (required, identity key)
    pub sequence: String,

    pub parent_matches: ParentMatches,

    pub result: ScoredProcessingResult,
}

impl IdentifiedPeptide {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            parent_matches: ParentMatches::new(),
            result: ScoredProcessingResult::default(),
        }
    }

    #[must_use]
    pub fn with_parent_match(mut self, parent: Handle<ParentMolecule>, m: ParentMatch) -> Self {
        self.parent_matches.entry(parent).or_default().insert(m);
        self
    }
}

/// An oligonucleotide identified from one or more data queries
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedOligo {
    /// Residue sequence (required, identity key)
    pub sequence: String,

    pub parent_matches: ParentMatches,

    pub result: ScoredProcessingResult,
}

impl IdentifiedOligo {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            parent_matches: ParentMatches::new(),
            result: ScoredProcessingResult::default(),
        }
    }

    #[must_use]
    pub fn with_parent_match(mut self, parent: Handle<ParentMolecule>, m: ParentMatch) -> Self {
        self.parent_matches.entry(parent).or_default().insert(m);
        self
    }
}

macro_rules! impl_sequence_molecule {
    ($ty:ty, $parent_type:expr) => {
        impl SequenceMolecule for $ty {
            const PARENT_TYPE: MoleculeType = $parent_type;

            fn sequence(&self) -> &str {
                &self.sequence
            }

            fn parent_matches(&self) -> &ParentMatches {
                &self.parent_matches
            }

            fn parent_matches_mut(&mut self) -> &mut ParentMatches {
                &mut self.parent_matches
            }
        }

        impl Identified for $ty {
            type Key = String;

            fn identity_key(&self) -> String {
                self.sequence.clone()
            }
        }
    };
}

impl_sequence_molecule!(IdentifiedPeptide, MoleculeType::Protein);
impl_sequence_molecule!(IdentifiedOligo, MoleculeType::Rna);

/// A small molecule identified from one or more data queries
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifiedCompound {
    /// Database identifier (required, identity key)
    pub identifier: String,

    /// Empirical formula, e.g. `C6H12O6`
    pub formula: String,

    pub name: String,

    pub smile: String,

    pub inchi: String,

    pub result: ScoredProcessingResult,
}

impl IdentifiedCompound {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            formula: String::new(),
            name: String::new(),
            smile: String::new(),
            inchi: String::new(),
            result: ScoredProcessingResult::default(),
        }
    }

    #[must_use]
    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = formula.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Identified for IdentifiedCompound {
    type Key = String;

    fn identity_key(&self) -> String {
        self.identifier.clone()
    }
}

/// A set of parent molecules that cannot be distinguished (protein group)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParentMoleculeGroup {
    pub parent_molecules: BTreeSet<Handle<ParentMolecule>>,

    pub result: ScoredProcessingResult,
}

impl ParentMoleculeGroup {
    pub fn new(parent_molecules: impl IntoIterator<Item = Handle<ParentMolecule>>) -> Self {
        Self {
            parent_molecules: parent_molecules.into_iter().collect(),
            result: ScoredProcessingResult::default(),
        }
    }
}

impl Identified for ParentMoleculeGroup {
    type Key = BTreeSet<Handle<ParentMolecule>>;

    fn identity_key(&self) -> Self::Key {
        self.parent_molecules.clone()
    }
}

impl_scored!(
    ParentMolecule,
    IdentifiedPeptide,
    IdentifiedOligo,
    IdentifiedCompound,
    ParentMoleculeGroup,
);
