//! Cleanup command - apply retention rules to a registered batch.
//!
//! Rules come from the batch's `cleanup` section; flags on the command line
//! override individual rules.

use std::path::PathBuf;

use clap::Args;

use crate::analysis::{CleanupConfig, CleanupReport};
use crate::cli::batch::Batch;
use crate::cli::summary::{count_rows, print_counts_text};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct CleanupArgs {
    /// JSON batch file
    #[arg(required = true)]
    pub batch: PathBuf,

    /// Ignore the batch's rules and only repair dangling references
    #[arg(long)]
    pub repair_only: bool,

    /// Drop parent molecules outside every parent group
    #[arg(long)]
    pub require_parent_group: bool,

    /// Drop peptides and oligos without parent matches
    #[arg(long)]
    pub require_parent_match: bool,

    /// Drop query matches outside every match group
    #[arg(long)]
    pub require_match_group: bool,

    /// Keep data queries and molecules that no query match uses
    #[arg(long)]
    pub keep_unmatched: bool,

    /// Keep parent molecules that no identified sequence maps onto
    #[arg(long)]
    pub keep_unreferenced_parents: bool,
}

impl CleanupArgs {
    /// Combine the batch's rules with the command-line overrides
    pub fn config(&self, from_batch: CleanupConfig) -> CleanupConfig {
        let mut config = if self.repair_only {
            CleanupConfig::none()
        } else {
            from_batch
        };
        config.require_parent_group |= self.require_parent_group;
        config.require_parent_match |= self.require_parent_match;
        config.require_match_group |= self.require_match_group;
        if self.keep_unmatched {
            config.require_query_match = false;
        }
        if self.keep_unreferenced_parents {
            config.require_identified_sequence = false;
        }
        config
    }
}

const REPORT_FIELDS: usize = 11;

fn report_rows(report: &CleanupReport) -> [(&'static str, String); REPORT_FIELDS] {
    [
        ("parent_molecules_removed", report.parent_molecules_removed.to_string()),
        ("parent_matches_removed", report.parent_matches_removed.to_string()),
        ("peptides_removed", report.peptides_removed.to_string()),
        ("compounds_removed", report.compounds_removed.to_string()),
        ("oligos_removed", report.oligos_removed.to_string()),
        ("data_queries_removed", report.data_queries_removed.to_string()),
        ("query_matches_removed", report.query_matches_removed.to_string()),
        ("parent_groups_removed", report.parent_groups_removed.to_string()),
        ("match_groups_removed", report.match_groups_removed.to_string()),
        ("parent_groups_degraded", report.parent_groups_degraded.to_string()),
        ("match_groups_degraded", report.match_groups_degraded.to_string()),
    ]
}

/// Execute the cleanup command
///
/// # Errors
///
/// Returns an error if the batch cannot be read or is rejected.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: CleanupArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let batch = Batch::load(&args.batch)?;
    let config = args.config(batch.cleanup);
    let mut replay = batch.replay()?;

    if verbose {
        eprintln!("Cleanup rules: {config:?}");
    }

    let report = replay.data.cleanup(&config);
    let counts = replay.data.counts();

    match format {
        OutputFormat::Text => {
            println!("Cleanup of {}", args.batch.display());
            println!("\n   Removed {} entities", report.total_removed());
            for (label, value) in report_rows(&report) {
                println!("   {label:<26} {value}");
            }
            if report.parent_groups_degraded || report.match_groups_degraded {
                println!("\n   Warning: some groups lost members");
            }
            println!("\n   Remaining:");
            print_counts_text(&counts);
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "config": config,
                "report": report,
                "remaining": counts,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("field\tvalue");
            for (label, value) in report_rows(&report) {
                println!("{label}\t{value}");
            }
            for (label, count) in count_rows(&counts) {
                println!("remaining_{label}\t{count}");
            }
        }
    }

    Ok(())
}
