use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::molecule::{ParentMolecule, SequenceMolecule};
use crate::identification::IdentificationData;
use crate::registry::{Handle, Identified, Registry};
use crate::utils::sequence::{ResidueCounter, SequenceLengthResolver};

#[inline]
fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Options for coverage calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Only count matches whose span equals the identified molecule's length
    pub check_molecule_length: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            check_molecule_length: true,
        }
    }
}

/// Per-parent residue flags accumulated over one coverage pass
struct CoverageTracker<'a, R: SequenceLengthResolver + ?Sized> {
    parents: &'a Registry<ParentMolecule>,
    resolver: &'a R,
    check_molecule_length: bool,
    lengths: HashMap<Handle<ParentMolecule>, usize>,
    covered: HashMap<Handle<ParentMolecule>, Vec<bool>>,
}

impl<'a, R: SequenceLengthResolver + ?Sized> CoverageTracker<'a, R> {
    fn new(parents: &'a Registry<ParentMolecule>, resolver: &'a R, check: bool) -> Self {
        Self {
            parents,
            resolver,
            check_molecule_length: check,
            lengths: HashMap::new(),
            covered: HashMap::new(),
        }
    }

    /// Parent length, resolved at most once per pass
    fn parent_length(&mut self, parent: Handle<ParentMolecule>) -> usize {
        if let Some(&length) = self.lengths.get(&parent) {
            return length;
        }
        let length = self.parents.get(parent).map_or(0, |p| {
            self.resolver.residue_count(&p.sequence, p.molecule_type)
        });
        self.lengths.insert(parent, length);
        length
    }

    fn add_molecules<T: SequenceMolecule + Identified>(&mut self, molecules: &Registry<T>) {
        for (_, molecule) in molecules.iter() {
            let molecule_length = if self.check_molecule_length {
                self.resolver
                    .residue_count(molecule.sequence(), T::PARENT_TYPE)
            } else {
                0
            };

            for (&parent, matches) in molecule.parent_matches() {
                let parent_length = self.parent_length(parent);
                if parent_length == 0 {
                    continue;
                }
                for m in matches {
                    if !m.has_valid_positions(molecule_length, parent_length) {
                        continue;
                    }
                    if let (Some(start), Some(end)) = (m.start, m.end) {
                        let flags = self
                            .covered
                            .entry(parent)
                            .or_insert_with(|| vec![false; parent_length]);
                        flags[start..=end].fill(true);
                    }
                }
            }
        }
    }

    fn into_coverages(self) -> HashMap<Handle<ParentMolecule>, f64> {
        self.covered
            .into_iter()
            .map(|(parent, flags)| {
                let covered = flags.iter().filter(|&&flag| flag).count();
                (parent, count_to_f64(covered) / count_to_f64(flags.len()))
            })
            .collect()
    }
}

impl IdentificationData {
    /// Compute the fraction of each parent molecule covered by identified
    /// peptides and oligonucleotides, counting residues with
    /// [`ResidueCounter`].
    pub fn calculate_coverages(&mut self, check_molecule_length: bool) {
        self.calculate_coverages_with(check_molecule_length, &ResidueCounter);
    }

    /// Compute parent coverages with a caller-supplied length resolver.
    ///
    /// Parents whose length resolves to zero are skipped. Parents that no
    /// match touches get a coverage of `0.0`.
    pub fn calculate_coverages_with<R>(&mut self, check_molecule_length: bool, resolver: &R)
    where
        R: SequenceLengthResolver + ?Sized,
    {
        let coverages = {
            let mut tracker =
                CoverageTracker::new(&self.parent_molecules, resolver, check_molecule_length);
            tracker.add_molecules(&self.peptides);
            tracker.add_molecules(&self.oligos);
            tracker.into_coverages()
        };

        for parent in self.parent_molecules.handles() {
            let coverage = coverages.get(&parent).copied().unwrap_or(0.0);
            self.parent_molecules.modify(parent, |p| p.coverage = coverage);
        }
        debug!(
            "coverage computed for {} of {} parent molecules",
            coverages.len(),
            self.parent_molecules.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::molecule::{IdentifiedOligo, IdentifiedPeptide, ParentMatch};
    use crate::core::types::MoleculeType;

    fn coverage_of(data: &IdentificationData, parent: Handle<ParentMolecule>) -> f64 {
        data.parent_molecules().get(parent).unwrap().coverage
    }

    fn store_with_parent(sequence: &str) -> (IdentificationData, Handle<ParentMolecule>) {
        let mut data = IdentificationData::new();
        let parent = data
            .register_parent_molecule(
                ParentMolecule::new("P1", MoleculeType::Protein).with_sequence(sequence),
            )
            .unwrap();
        (data, parent)
    }

    #[test]
    fn test_full_coverage() {
        let (mut data, parent) = store_with_parent("ACDEFGHIKL");
        data.register_identified_peptide(
            IdentifiedPeptide::new("ACDEF").with_parent_match(parent, ParentMatch::new(0, 4)),
        )
        .unwrap();
        data.register_identified_peptide(
            IdentifiedPeptide::new("GHIKL").with_parent_match(parent, ParentMatch::new(5, 9)),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!((coverage_of(&data, parent) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_coverage() {
        let (mut data, parent) = store_with_parent("ACDEFGHIKL");
        data.register_identified_peptide(
            IdentifiedPeptide::new("ACD").with_parent_match(parent, ParentMatch::new(0, 2)),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!((coverage_of(&data, parent) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_matches_count_once() {
        let (mut data, parent) = store_with_parent("ACDEFGHIKL");
        data.register_identified_peptide(
            IdentifiedPeptide::new("ACDEF").with_parent_match(parent, ParentMatch::new(0, 4)),
        )
        .unwrap();
        data.register_identified_peptide(
            IdentifiedPeptide::new("DEFGH").with_parent_match(parent, ParentMatch::new(2, 6)),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!((coverage_of(&data, parent) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_length_check() {
        let (mut data, parent) = store_with_parent("ACDEFGHIKL");
        // span of 5 for a 3-residue peptide
        data.register_identified_peptide(
            IdentifiedPeptide::new("ACD").with_parent_match(parent, ParentMatch::new(0, 4)),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!(coverage_of(&data, parent).abs() < 1e-9);

        data.calculate_coverages(false);
        assert!((coverage_of(&data, parent) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_positions_are_ignored() {
        let (mut data, parent) = store_with_parent("ACDEFGHIKL");
        data.register_identified_peptide(
            IdentifiedPeptide::new("KLM").with_parent_match(parent, ParentMatch::new(8, 10)),
        )
        .unwrap();
        data.register_identified_peptide(
            IdentifiedPeptide::new("HIK").with_parent_match(parent, ParentMatch::unknown()),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!(coverage_of(&data, parent).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_parent_skipped_others_continue() {
        let mut data = IdentificationData::new();
        let empty = data
            .register_parent_molecule(ParentMolecule::new("EMPTY", MoleculeType::Protein))
            .unwrap();
        let real = data
            .register_parent_molecule(
                ParentMolecule::new("REAL", MoleculeType::Protein).with_sequence("ACDE"),
            )
            .unwrap();
        data.register_identified_peptide(
            IdentifiedPeptide::new("AC")
                .with_parent_match(empty, ParentMatch::new(0, 1))
                .with_parent_match(real, ParentMatch::new(0, 1)),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!(coverage_of(&data, empty).abs() < 1e-9);
        assert!((coverage_of(&data, real) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_oligo_coverage() {
        let mut data = IdentificationData::new();
        let rna = data
            .register_parent_molecule(
                ParentMolecule::new("R1", MoleculeType::Rna).with_sequence("ACGUACGU"),
            )
            .unwrap();
        data.register_identified_oligo(
            IdentifiedOligo::new("ACGU").with_parent_match(rna, ParentMatch::new(4, 7)),
        )
        .unwrap();

        data.calculate_coverages(true);
        assert!((coverage_of(&data, rna) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_custom_resolver_is_called_once_per_parent() {
        use std::cell::Cell;

        let (mut data, parent) = store_with_parent("ignored");
        for (sequence, start) in [("AA", 0), ("BB", 2), ("CC", 4)] {
            data.register_identified_peptide(
                IdentifiedPeptide::new(sequence)
                    .with_parent_match(parent, ParentMatch::new(start, start + 1)),
            )
            .unwrap();
        }

        let parent_calls = Cell::new(0);
        let resolver = |sequence: &str, _: MoleculeType| {
            if sequence == "ignored" {
                parent_calls.set(parent_calls.get() + 1);
                12
            } else {
                2
            }
        };

        data.calculate_coverages_with(true, &resolver);
        assert_eq!(parent_calls.get(), 1);
        assert!((coverage_of(&data, parent) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_config_defaults() {
        assert!(CoverageConfig::default().check_molecule_length);
        let config: CoverageConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CoverageConfig::default());
    }
}
