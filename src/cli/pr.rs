//! Pr command implementation

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use super::utils::Services;
use crate::analysis::SymbolImpactAnalyzer;
use crate::codegen::{GenerationSettings, PreparedChanges, PullRequestAssembler};
use crate::config::load_config;
use crate::domain::ChangeType;

#[derive(Args)]
pub struct PrArgs {
    /// Task description; the first line becomes the PR title
    #[arg(value_name = "DESCRIPTION")]
    pub description: String,

    /// Query used to retrieve related code from the index
    #[arg(short = 'q', long, value_name = "QUERY")]
    pub context_query: Option<String>,

    /// Branch the pull request targets (defaults to the default branch)
    #[arg(short, long, value_name = "BRANCH")]
    pub base_branch: Option<String>,

    /// Maximum number of files to generate (defaults to `max_files`)
    #[arg(short = 'm', long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Print the plan and generated changes without opening a PR
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(config_path: Option<PathBuf>, args: PrArgs) -> Result<()> {
    let config = load_config(config_path.as_deref())?;
    let services = Services::new(config)?;

    let mut settings = GenerationSettings::from(&services.config);
    if let Some(max_files) = args.max_files {
        settings.max_files = max_files;
    }

    let accessor = services.accessor(None, None)?;
    let assembler = PullRequestAssembler::new(
        services.openai.clone(),
        accessor.clone(),
        services.retriever()?,
        Arc::new(SymbolImpactAnalyzer::new(accessor)),
        settings,
    );
    let context_query = args.context_query.as_deref();

    if args.dry_run {
        let prepared = assembler.prepare(&args.description, context_query).await?;
        print_prepared(&prepared);
        return Ok(());
    }

    match assembler
        .submit(&args.description, context_query, args.base_branch.as_deref())
        .await?
    {
        Some(number) => println!("Created PR #{number}"),
        None => println!("No changes were generated; no pull request created"),
    }
    Ok(())
}

fn print_prepared(prepared: &PreparedChanges) {
    println!("Plan:");
    for entry in prepared.planning.plan.summary() {
        println!("  {entry}");
    }

    let outcome = &prepared.outcome;
    for file in &prepared.files {
        let kinds: Vec<&str> =
            outcome.change_types(&file.path).iter().map(ChangeType::as_str).collect();
        println!("\n=== {} ({}) ===\n{}", file.path, kinds.join(", "), file.content.trim_end());
    }

    if !outcome.failures.is_empty() {
        println!("\nFailures:");
        for failure in &outcome.failures {
            println!("  {}: {}", failure.path, failure.kind);
        }
    }
    if !outcome.unfinished.is_empty() {
        println!("\nNot generated: {}", outcome.unfinished.join(", "));
    }

    let impact = &prepared.impact;
    println!(
        "\nImpact: {} new, {} modified, {} affected symbols",
        impact.new_symbols.len(),
        impact.modified_symbols.len(),
        impact.affected_symbols.len()
    );
}
