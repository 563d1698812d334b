//! Summary command - register a batch and count what it contains.

use crate::cli::batch::Batch;
use crate::cli::{BatchArgs, OutputFormat};
use crate::identification::RegistryCounts;

/// Registry labels paired with their counts, in reference order
pub(crate) fn count_rows(counts: &RegistryCounts) -> [(&'static str, usize); 13] {
    [
        ("input_files", counts.input_files),
        ("software", counts.software),
        ("search_params", counts.search_params),
        ("processing_steps", counts.processing_steps),
        ("score_types", counts.score_types),
        ("data_queries", counts.data_queries),
        ("parent_molecules", counts.parent_molecules),
        ("parent_groups", counts.parent_groups),
        ("peptides", counts.peptides),
        ("compounds", counts.compounds),
        ("oligos", counts.oligos),
        ("query_matches", counts.query_matches),
        ("match_groups", counts.match_groups),
    ]
}

pub(crate) fn print_counts_text(counts: &RegistryCounts) {
    for (label, count) in count_rows(counts) {
        println!("   {label:<18} {count}");
    }
}

/// Execute the summary command
///
/// # Errors
///
/// Returns an error if the batch cannot be read or is rejected.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: BatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let batch = Batch::load(&args.batch)?;
    let replay = batch.replay()?;
    let counts = replay.data.counts();

    if verbose {
        eprintln!("Registered batch {}", args.batch.display());
    }

    match format {
        OutputFormat::Text => {
            println!("Batch: {}", args.batch.display());
            print_counts_text(&counts);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
        OutputFormat::Tsv => {
            println!("registry\tcount");
            for (label, count) in count_rows(&counts) {
                println!("{label}\t{count}");
            }
        }
    }

    Ok(())
}
