//! Index command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::utils::{parse_csv, Services};
use crate::config::load_config;
use crate::index::{CodebaseIndexer, IndexOptions};

#[derive(Args)]
pub struct IndexArgs {
    /// Branch to index (defaults to the repository's default branch)
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Include only paths matching these globs (comma-separated)
    #[arg(short = 'i', long, value_name = "GLOBS")]
    pub include: Option<String>,

    /// Exclude paths matching these globs (comma-separated)
    #[arg(short = 'e', long, value_name = "GLOBS")]
    pub exclude: Option<String>,
}

pub async fn run(config_path: Option<PathBuf>, args: IndexArgs) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let services = Services::new(config)?;
    let accessor = services.accessor(parse_csv(&args.include), parse_csv(&args.exclude))?;

    let options = IndexOptions {
        chunk_tokens: services.config.chunk_tokens,
        chunk_overlap: services.config.chunk_overlap,
        batch_size: services.config.embedding_batch_size,
        progress: true,
    };
    let indexer = CodebaseIndexer::new(accessor, services.openai.clone(), options);
    let mut store = services.open_store()?;
    let repo = services.config.repo_slug();

    let report = indexer
        .index(&mut store, &repo, args.branch.as_deref())
        .await
        .with_context(|| format!("Failed indexing {repo}"))?;

    println!(
        "Indexed {} chunks from {} of {} files on {}@{}",
        report.chunks, report.files_indexed, report.files_total, repo, report.branch
    );
    if report.files_failed > 0 {
        println!("Skipped {} files that could not be fetched", report.files_failed);
    }
    println!("Index: {}", services.index_path().display());
    Ok(())
}
