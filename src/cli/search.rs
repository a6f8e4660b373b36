//! Search command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use super::utils::Services;
use crate::config::load_config;
use crate::retrieve::VectorSearch;

#[derive(Args)]
pub struct SearchArgs {
    /// Natural-language or code query
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum number of results (defaults to `search_limit`)
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Only search under this directory
    #[arg(short, long, value_name = "DIR")]
    pub directory: Option<String>,

    /// Only search files of this language (e.g. python, typescript)
    #[arg(short, long, value_name = "LANG")]
    pub language: Option<String>,
}

pub async fn run(config_path: Option<PathBuf>, args: SearchArgs) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let services = Services::new(config)?;
    let limit = args.limit.unwrap_or(services.config.search_limit);

    if args.query.trim().is_empty() || limit == 0 {
        println!("No results");
        return Ok(());
    }

    let mut filter = services.repo_filter();
    filter.directory = args.directory;
    filter.language = args.language;
    let search = services.index_search(filter)?;

    let hits = search.search(args.query.trim(), limit).await?;
    if hits.is_empty() {
        println!("No results (run `repo-codegen index` if the index is empty)");
        return Ok(());
    }
    for hit in hits {
        println!(
            "File: {} (lines {}-{}, score {:.3})\n{}\n",
            hit.path,
            hit.start_line,
            hit.end_line,
            hit.score,
            hit.content.trim_end()
        );
    }
    Ok(())
}
