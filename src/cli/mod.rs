//! Command-line interface for repo-codegen
//!
//! Provides `verify`, `index`, `search`, `pr` and `completions` subcommands.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::future::Future;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod index;
mod pr;
mod search;
mod utils;
mod verify;

/// Index a GitHub repository and turn task descriptions into pull requests
#[derive(Parser)]
#[command(name = "repo-codegen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (config.yml or config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration, tree-sitter support and the local index
    Verify,

    /// Rebuild the semantic index from the repository
    Index(index::IndexArgs),

    /// Search the index for code similar to a query
    Search(search::SearchArgs),

    /// Plan and synthesize changes for a task and open a pull request
    Pr(pr::PrArgs),

    /// Print shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Wire verbose flag to the tracing log level.
    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let config = cli.config;
    match cli.command {
        Commands::Verify => verify::run(config),
        Commands::Index(args) => block_on(index::run(config, args)),
        Commands::Search(args) => block_on(search::run(config, args)),
        Commands::Pr(args) => block_on(pr::run(config, args)),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "repo-codegen",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

/// Remote calls run one at a time on a current-thread runtime.
fn block_on<F: Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["repo-codegen", "search", "login", "-v", "-c", "x.yml"])
            .expect("parse");
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.yml")));
    }
}
