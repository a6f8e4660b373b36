//! Verify command implementation

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::config::loader::{env_provider, explicit_config_path};
use crate::config::{config_root_dir, default_index_path, load_unvalidated, resolved_config_path};
use crate::github::PathFilter;
use crate::index::VectorStore;
use crate::lang::supported_tree_sitter_languages;

pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let mut issues: Vec<String> = Vec::new();

    match resolved_config_path(config_path.as_deref()) {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (defaults and environment)"),
    }

    let explicit = explicit_config_path(config_path.as_deref());
    let config = match load_unvalidated(explicit.as_deref(), config_root_dir(), env_provider()) {
        Ok(config) => Some(config),
        Err(err) => {
            issues.push(err.to_string());
            None
        }
    };

    if let Some(config) = &config {
        let missing = config.missing_required();
        if !missing.is_empty() {
            issues.push(format!("Missing required configuration: {}", missing.join(", ")));
        }
        if let Err(err) = PathFilter::new(&config.include_globs, &config.exclude_globs) {
            issues.push(format!("{err:#}"));
        }

        println!("Repository: {}", config.repo_slug());
        println!("Completion model: {}", config.completion_model);
        println!("Embeddings model: {}", config.embeddings_model);

        let index_path = config.db_path.clone().unwrap_or_else(default_index_path);
        if index_path.exists() {
            match VectorStore::open(&index_path).and_then(|store| store.stats()) {
                Ok(stats) => println!(
                    "Index: {} ({} chunks from {} files)",
                    index_path.display(),
                    stats.chunks,
                    stats.files
                ),
                Err(err) => issues.push(format!("Index {}: {err:#}", index_path.display())),
            }
        } else {
            println!("Index: {} (not built yet)", index_path.display());
        }
    }

    println!("Tree-sitter languages: {}", supported_tree_sitter_languages().join(", "));

    if issues.is_empty() {
        println!("All checks passed");
        return Ok(());
    }
    for issue in &issues {
        eprintln!("  - {issue}");
    }
    bail!("Verification failed with {} issue(s)", issues.len());
}
