//! Residue counting for parent and identified sequences.
//!
//! Full sequence parsing belongs to a sequence library; coverage only needs
//! the number of residues, which is what [`SequenceLengthResolver`] provides.

use crate::core::types::MoleculeType;

/// Resolves the number of residues in a raw sequence string
pub trait SequenceLengthResolver {
    /// Number of residues in `sequence`, or zero if it cannot be parsed
    fn residue_count(&self, sequence: &str, molecule_type: MoleculeType) -> usize;
}

impl<F> SequenceLengthResolver for F
where
    F: Fn(&str, MoleculeType) -> usize,
{
    fn residue_count(&self, sequence: &str, molecule_type: MoleculeType) -> usize {
        self(sequence, molecule_type)
    }
}

/// Default resolver counting one-letter residue codes.
///
/// Modification annotations in `(...)` or `[...]` are skipped and `.`
/// terminus delimiters are ignored. Anything else outside the alphabet of
/// the molecule type makes the sequence unparsable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResidueCounter;

impl ResidueCounter {
    fn is_residue(c: char, molecule_type: MoleculeType) -> bool {
        match molecule_type {
            MoleculeType::Protein => c.is_ascii_uppercase(),
            MoleculeType::Rna => matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'U' | 'N'),
            MoleculeType::Compound => false,
        }
    }
}

impl SequenceLengthResolver for ResidueCounter {
    fn residue_count(&self, sequence: &str, molecule_type: MoleculeType) -> usize {
        let mut count = 0;
        let mut depth = 0usize;

        for c in sequence.chars() {
            match c {
                '(' | '[' => depth += 1,
                ')' | ']' => {
                    if depth == 0 {
                        return 0;
                    }
                    depth -= 1;
                }
                _ if depth > 0 => {}
                '.' | '-' => {}
                c if Self::is_residue(c, molecule_type) => count += 1,
                _ => return 0,
            }
        }

        if depth == 0 {
            count
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_protein_sequence() {
        assert_eq!(ResidueCounter.residue_count("ACDEFGHIKL", MoleculeType::Protein), 10);
        assert_eq!(ResidueCounter.residue_count("", MoleculeType::Protein), 0);
    }

    #[test]
    fn test_modifications_are_not_residues() {
        let counter = ResidueCounter;
        assert_eq!(counter.residue_count("PEPM(Oxidation)TIDE", MoleculeType::Protein), 8);
        assert_eq!(counter.residue_count(".(Acetyl)PEPTIDE.", MoleculeType::Protein), 7);
        assert_eq!(counter.residue_count("PEPC[+57.021]K", MoleculeType::Protein), 5);
    }

    #[test]
    fn test_unparsable_sequences_have_zero_length() {
        let counter = ResidueCounter;
        assert_eq!(counter.residue_count("PEP TIDE", MoleculeType::Protein), 0);
        assert_eq!(counter.residue_count("PEPM(Oxidation", MoleculeType::Protein), 0);
        assert_eq!(counter.residue_count("PEP)", MoleculeType::Protein), 0);
        assert_eq!(counter.residue_count("ACGT", MoleculeType::Rna), 0);
        assert_eq!(counter.residue_count("C6H12O6", MoleculeType::Compound), 0);
    }

    #[test]
    fn test_rna_sequence() {
        assert_eq!(ResidueCounter.residue_count("ACGUacgu", MoleculeType::Rna), 8);
        assert_eq!(ResidueCounter.residue_count("AC[m6A]GU", MoleculeType::Rna), 4);
    }

    #[test]
    fn test_closure_resolver() {
        let fixed = |_: &str, _: MoleculeType| 42;
        assert_eq!(fixed.residue_count("anything", MoleculeType::Protein), 42);
    }
}
