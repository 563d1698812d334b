use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::{MassType, MoleculeType, ProcessingAction};
use crate::registry::{Handle, Identified};

/// A raw or intermediate data file that went into processing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputFile {
    pub name: String,
}

impl InputFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Identified for InputFile {
    type Key = String;

    fn identity_key(&self) -> String {
        self.name.clone()
    }
}

/// A program that produced or transformed identification results
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Software {
    pub name: String,
    pub version: String,
}

impl Software {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Identified for Software {
    type Key = (String, String);

    fn identity_key(&self) -> (String, String) {
        (self.name.clone(), self.version.clone())
    }
}

/// Settings of a sequence database search.
///
/// Digestion rules are resolved elsewhere; only the enzyme name is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DBSearchParam {
    pub molecule_type: MoleculeType,
    pub mass_type: MassType,
    pub database: String,
    pub database_version: String,
    pub taxonomy: String,
    pub charges: BTreeSet<i32>,
    pub fixed_mods: BTreeSet<String>,
    pub variable_mods: BTreeSet<String>,
    pub precursor_mass_tolerance: f64,
    pub fragment_mass_tolerance: f64,
    pub precursor_tolerance_ppm: bool,
    pub fragment_tolerance_ppm: bool,
    pub digestion_enzyme: Option<String>,
    pub missed_cleavages: usize,
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for DBSearchParam {
    fn default() -> Self {
        Self {
            molecule_type: MoleculeType::Protein,
            mass_type: MassType::Monoisotopic,
            database: String::new(),
            database_version: String::new(),
            taxonomy: String::new(),
            charges: BTreeSet::new(),
            fixed_mods: BTreeSet::new(),
            variable_mods: BTreeSet::new(),
            precursor_mass_tolerance: 0.0,
            fragment_mass_tolerance: 0.0,
            precursor_tolerance_ppm: false,
            fragment_tolerance_ppm: false,
            digestion_enzyme: None,
            missed_cleavages: 0,
            min_length: 0,
            max_length: 0,
        }
    }
}

impl DBSearchParam {
    #[must_use]
    pub fn with_database(
        mut self,
        database: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        self.database = database.into();
        self.database_version = version.into();
        self
    }

    #[must_use]
    pub fn with_precursor_tolerance(mut self, tolerance: f64, ppm: bool) -> Self {
        self.precursor_mass_tolerance = tolerance;
        self.precursor_tolerance_ppm = ppm;
        self
    }

    #[must_use]
    pub fn with_fragment_tolerance(mut self, tolerance: f64, ppm: bool) -> Self {
        self.fragment_mass_tolerance = tolerance;
        self.fragment_tolerance_ppm = ppm;
        self
    }

    #[must_use]
    pub fn with_enzyme(mut self, enzyme: impl Into<String>, missed_cleavages: usize) -> Self {
        self.digestion_enzyme = Some(enzyme.into());
        self.missed_cleavages = missed_cleavages;
        self
    }
}

/// Hashable image of every [`DBSearchParam`] field. Tolerances are compared
/// by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchParamKey {
    molecule_type: MoleculeType,
    mass_type: MassType,
    database: String,
    database_version: String,
    taxonomy: String,
    charges: BTreeSet<i32>,
    fixed_mods: BTreeSet<String>,
    variable_mods: BTreeSet<String>,
    tolerances: (u64, u64),
    ppm: (bool, bool),
    digestion_enzyme: Option<String>,
    lengths: (usize, usize, usize),
}

impl Identified for DBSearchParam {
    type Key = SearchParamKey;

    fn identity_key(&self) -> SearchParamKey {
        SearchParamKey {
            molecule_type: self.molecule_type,
            mass_type: self.mass_type,
            database: self.database.clone(),
            database_version: self.database_version.clone(),
            taxonomy: self.taxonomy.clone(),
            charges: self.charges.clone(),
            fixed_mods: self.fixed_mods.clone(),
            variable_mods: self.variable_mods.clone(),
            tolerances: (
                self.precursor_mass_tolerance.to_bits(),
                self.fragment_mass_tolerance.to_bits(),
            ),
            ppm: (self.precursor_tolerance_ppm, self.fragment_tolerance_ppm),
            digestion_enzyme: self.digestion_enzyme.clone(),
            lengths: (self.missed_cleavages, self.min_length, self.max_length),
        }
    }
}

/// One application of a piece of software to a set of input files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataProcessingStep {
    /// Software that performed the step (required)
    pub software: Handle<Software>,

    /// Files the step read, in order
    pub input_files: Vec<Handle<InputFile>>,

    /// Files the step was originally run on, before any conversion
    pub primary_files: Vec<String>,

    pub date_time: Option<DateTime<Utc>>,

    pub actions: BTreeSet<ProcessingAction>,
}

impl DataProcessingStep {
    pub fn new(software: Handle<Software>) -> Self {
        Self {
            software,
            input_files: Vec::new(),
            primary_files: Vec::new(),
            date_time: None,
            actions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_input_files(mut self, input_files: Vec<Handle<InputFile>>) -> Self {
        self.input_files = input_files;
        self
    }

    #[must_use]
    pub fn with_primary_files(mut self, primary_files: Vec<String>) -> Self {
        self.primary_files = primary_files;
        self
    }

    #[must_use]
    pub fn with_date_time(mut self, date_time: DateTime<Utc>) -> Self {
        self.date_time = Some(date_time);
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: ProcessingAction) -> Self {
        self.actions.insert(action);
        self
    }
}

impl Identified for DataProcessingStep {
    type Key = DataProcessingStep;

    fn identity_key(&self) -> DataProcessingStep {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_param_key_distinguishes_tolerances() {
        let a = DBSearchParam::default().with_precursor_tolerance(10.0, true);
        let b = DBSearchParam::default().with_precursor_tolerance(10.0, true);
        let c = DBSearchParam::default().with_precursor_tolerance(20.0, true);
        assert_eq!(a.identity_key(), b.identity_key());
        assert_ne!(a.identity_key(), c.identity_key());
    }

    #[test]
    fn test_software_key_includes_version() {
        let a = Software::new("Comet", "2019.01");
        let b = Software::new("Comet", "2020.01");
        assert_ne!(a.identity_key(), b.identity_key());
    }
}
