use serde::{Deserialize, Serialize};

/// Family of an identified or parent molecule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoleculeType {
    /// Proteins and the peptides derived from them
    Protein,
    /// Small molecules (metabolites, lipids, ...)
    Compound,
    /// RNA and the oligonucleotides derived from it
    Rna,
}

impl std::fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protein => write!(f, "protein"),
            Self::Compound => write!(f, "compound"),
            Self::Rna => write!(f, "RNA"),
        }
    }
}

/// How masses were computed for a database search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassType {
    #[default]
    Monoisotopic,
    Average,
}

/// Kind of work performed by a data processing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingAction {
    DataProcessing,
    ChargeDeconvolution,
    Deisotoping,
    Smoothing,
    ChargeCalculation,
    PrecursorRecalculation,
    BaselineReduction,
    PeakPicking,
    Alignment,
    Calibration,
    Normalization,
    Filtering,
    Quantitation,
    FeatureGrouping,
    IdentificationMapping,
    FormatConversion,
    Identification,
}

impl std::fmt::Display for ProcessingAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DataProcessing => "data processing",
            Self::ChargeDeconvolution => "charge deconvolution",
            Self::Deisotoping => "deisotoping",
            Self::Smoothing => "smoothing",
            Self::ChargeCalculation => "charge calculation",
            Self::PrecursorRecalculation => "precursor recalculation",
            Self::BaselineReduction => "baseline reduction",
            Self::PeakPicking => "peak picking",
            Self::Alignment => "alignment",
            Self::Calibration => "calibration",
            Self::Normalization => "normalization",
            Self::Filtering => "filtering",
            Self::Quantitation => "quantitation",
            Self::FeatureGrouping => "feature grouping",
            Self::IdentificationMapping => "identification mapping",
            Self::FormatConversion => "format conversion",
            Self::Identification => "identification",
        };
        write!(f, "{label}")
    }
}
