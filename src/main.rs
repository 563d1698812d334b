use clap::Parser;
use tracing_subscriber::EnvFilter;

use ident_graph::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("ident_graph=debug,info")
    } else {
        EnvFilter::new("ident_graph=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Summary(args) => {
            cli::summary::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Cleanup(args) => {
            cli::cleanup::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Coverage(args) => {
            cli::coverage::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::BestMatch(args) => {
            cli::best_match::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
