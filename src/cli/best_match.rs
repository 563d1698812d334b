//! Best-match command - the top-scoring match for every data query.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Args;
use serde::Serialize;

use crate::cli::batch::{molecule_label, Batch};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct BestMatchArgs {
    /// JSON batch file
    #[arg(required = true)]
    pub batch: PathBuf,

    /// Name of the score type to rank by
    #[arg(long, required = true)]
    pub score: String,

    /// Only consider the score type produced by this software
    #[arg(long)]
    pub software: Option<String>,
}

#[derive(Debug, Serialize)]
struct BestMatchRow {
    query: String,
    molecule_type: String,
    molecule: String,
    charge: i32,
    score: f64,
}

/// Execute the best-match command
///
/// # Errors
///
/// Returns an error if the batch cannot be read or is rejected, or if the
/// score type does not exist.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: BestMatchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let batch = Batch::load(&args.batch)?;
    let replay = batch.replay()?;
    let data = &replay.data;

    let software = match &args.software {
        Some(name) => Some(
            replay
                .software_named(name)
                .with_context(|| format!("Unknown software '{name}'"))?,
        ),
        None => None,
    };
    let score_type = data
        .find_score_type(&args.score, software)
        .ok_or_else(|| anyhow!("Unknown score type '{}'", args.score))?;

    let best = data.best_match_per_query(score_type);
    if verbose {
        eprintln!(
            "{} of {} data queries have a match scored by '{}'",
            best.len(),
            data.data_queries().len(),
            args.score
        );
    }

    let rows: Vec<BestMatchRow> = best
        .iter()
        .filter_map(|&handle| data.query_matches().get(handle))
        .map(|m| BestMatchRow {
            query: data
                .data_queries()
                .get(m.data_query)
                .map(|q| q.data_id.clone())
                .unwrap_or_default(),
            molecule_type: m.molecule_type().to_string(),
            molecule: molecule_label(data, m.identified_molecule),
            charge: m.charge,
            score: m.result.scores.get(score_type).unwrap_or(f64::NAN),
        })
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Best match per query by '{}'", args.score);
            for row in &rows {
                println!(
                    "   {:<16} {:<24} {:>3}+  {}  ({})",
                    row.query, row.molecule, row.charge, row.score, row.molecule_type
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Tsv => {
            println!("query\tmolecule_type\tmolecule\tcharge\tscore");
            for row in &rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.query, row.molecule_type, row.molecule, row.charge, row.score
                );
            }
        }
    }

    Ok(())
}
