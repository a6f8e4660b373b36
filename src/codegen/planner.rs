//! Turns a task description into an ordered implementation plan.

use super::parse::parse_plan;
use super::prompts::planning_prompt;
use super::GenerationSettings;
use crate::domain::{ContextItem, DuplicateCreatePolicy, Plan, PlanAction};
use crate::github::RepositoryAccessor;
use crate::llm::{ChatMessage, CompletionModel};
use crate::retrieve::{format_context, ContextRetriever};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PlanningResult {
    pub plan: Plan,
    pub context: Vec<ContextItem>,
    pub existing_files: BTreeSet<String>,
}

impl PlanningResult {
    /// Context blocks as they appear in prompts.
    pub fn context_text(&self) -> String {
        format_context(&self.context)
    }
}

pub struct ChangePlanner {
    model: Arc<dyn CompletionModel>,
    accessor: RepositoryAccessor,
    retriever: ContextRetriever,
    settings: GenerationSettings,
}

impl ChangePlanner {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        accessor: RepositoryAccessor,
        retriever: ContextRetriever,
        settings: GenerationSettings,
    ) -> Self {
        Self { model, accessor, retriever, settings }
    }

    pub async fn plan(
        &self,
        description: &str,
        context_query: Option<&str>,
    ) -> Result<PlanningResult> {
        let existing_files = self.accessor.list_existing_files().await;
        tracing::info!("Found {} existing files in repository", existing_files.len());

        let context = match context_query {
            Some(query) => self
                .retriever
                .retrieve(query, self.settings.context_limit)
                .await
                .context("Failed retrieving code context")?,
            None => Vec::new(),
        };

        let prompt = planning_prompt(description, &existing_files, &format_context(&context));
        let raw = self
            .model
            .complete(&self.settings.completion_model, &[ChatMessage::user(prompt)])
            .await
            .context("Planning request failed")?;

        let mut plan = parse_plan(&raw);
        apply_duplicate_policy(&mut plan, &existing_files, self.settings.duplicate_create_policy);
        tracing::info!("Planned files: {}", plan.summary().join(", "));
        if !plan.is_complete() {
            tracing::warn!("Plan has entries without an action");
        }

        Ok(PlanningResult { plan, context, existing_files })
    }
}

/// Handle planned creates of files that already exist.
pub fn apply_duplicate_policy(
    plan: &mut Plan,
    existing_files: &BTreeSet<String>,
    policy: DuplicateCreatePolicy,
) {
    let is_duplicate = |action: PlanAction, path: &str| {
        action == PlanAction::Create && existing_files.contains(path)
    };

    match policy {
        DuplicateCreatePolicy::Allow => {
            for file in plan.files.iter().filter(|f| is_duplicate(f.action, &f.path)) {
                tracing::debug!("Plan creates {} which already exists", file.path);
            }
        }
        DuplicateCreatePolicy::Convert => {
            for file in plan.files.iter_mut() {
                if is_duplicate(file.action, &file.path) {
                    tracing::info!("Converting create of existing {} into modify", file.path);
                    file.action = PlanAction::Modify;
                }
            }
        }
        DuplicateCreatePolicy::Reject => {
            plan.files.retain(|file| {
                let duplicate = is_duplicate(file.action, &file.path);
                if duplicate {
                    tracing::warn!("Dropping planned create of existing file {}", file.path);
                }
                !duplicate
            });
        }
    }
}
