//! Coverage command - fraction of each parent molecule covered by
//! identified sequences.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::batch::Batch;
use crate::cli::OutputFormat;
use crate::utils::sequence::{ResidueCounter, SequenceLengthResolver};

#[derive(Args)]
pub struct CoverageArgs {
    /// JSON batch file
    #[arg(required = true)]
    pub batch: PathBuf,

    /// Count matches whose span differs from the identified sequence's length
    #[arg(long)]
    pub skip_length_check: bool,
}

#[derive(Debug, Serialize)]
struct CoverageRow {
    accession: String,
    molecule_type: String,
    length: usize,
    coverage: f64,
}

/// Execute the coverage command
///
/// # Errors
///
/// Returns an error if the batch cannot be read or is rejected.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: CoverageArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let batch = Batch::load(&args.batch)?;
    let check_length = batch.coverage.check_molecule_length && !args.skip_length_check;
    let mut replay = batch.replay()?;

    if verbose {
        eprintln!("Molecule length check: {check_length}");
    }

    replay.data.calculate_coverages(check_length);

    let rows: Vec<CoverageRow> = replay
        .data
        .parent_molecules()
        .iter()
        .map(|(_, parent)| CoverageRow {
            accession: parent.accession.clone(),
            molecule_type: parent.molecule_type.to_string(),
            length: ResidueCounter.residue_count(&parent.sequence, parent.molecule_type),
            coverage: parent.coverage,
        })
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Coverage of {} parent molecules", rows.len());
            for row in &rows {
                println!(
                    "   {:<20} {:>7.1}%  ({}, {} residues)",
                    row.accession,
                    row.coverage * 100.0,
                    row.molecule_type,
                    row.length
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Tsv => {
            println!("accession\tmolecule_type\tlength\tcoverage");
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{:.4}",
                    row.accession, row.molecule_type, row.length, row.coverage
                );
            }
        }
    }

    Ok(())
}
