//! Command-line interface for ident-graph.
//!
//! Every command reads a JSON batch (see [`batch`]), registers it into a
//! fresh store and reports on the result:
//!
//! - **summary**: Count the registered entities
//! - **cleanup**: Remove disconnected entities and report what went
//! - **coverage**: Compute parent molecule sequence coverage
//! - **best-match**: Pick the best-scoring match for every data query
//!
//! ## Usage
//!
//! ```text
//! # Counts per registry
//! ident-graph summary run.json
//!
//! # Keep only parents that belong to a protein group
//! ident-graph cleanup run.json --require-parent-group
//!
//! # Best match per spectrum, as TSV
//! ident-graph best-match run.json --score q-value --format tsv
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod batch;
pub mod best_match;
pub mod cleanup;
pub mod coverage;
pub mod summary;

#[derive(Parser)]
#[command(name = "ident-graph")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Register, clean up and summarize mass-spectrometry identifications")]
#[command(
    long_about = "ident-graph loads identification results into a referentially consistent store.\n\nEvery record is validated against the entities it refers to, so a batch that\nreplays successfully is free of dangling references. On top of the store it can:\n- Remove entities disconnected under configurable retention rules\n- Compute protein and RNA sequence coverage\n- Select the best-scoring match for every data query"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how many entities a batch registers
    Summary(BatchArgs),

    /// Remove entities that are disconnected under the retention rules
    Cleanup(cleanup::CleanupArgs),

    /// Compute sequence coverage of parent molecules
    Coverage(coverage::CoverageArgs),

    /// Select the best-scoring match for every data query
    BestMatch(best_match::BestMatchArgs),
}

/// The batch every command reads
#[derive(Args)]
pub struct BatchArgs {
    /// JSON batch file
    #[arg(required = true)]
    pub batch: PathBuf,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
