//! Final assembly: splice changes, analyze impact, open the pull request.

use super::planner::{ChangePlanner, PlanningResult};
use super::splice::finalize;
use super::synth::{Synthesis, SynthesisOutcome};
use super::GenerationSettings;
use crate::analysis::{ImpactAnalyzer, ImpactReport};
use crate::domain::{FileChange, FileChangeWithType};
use crate::github::RepositoryAccessor;
use crate::llm::CompletionModel;
use crate::render::{render_pr_description, render_pr_title};
use crate::retrieve::ContextRetriever;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Everything produced for a description short of opening the PR.
#[derive(Debug, Clone)]
pub struct PreparedChanges {
    pub planning: PlanningResult,
    pub outcome: SynthesisOutcome,
    /// Final file contents, one entry per path.
    pub files: Vec<FileChange>,
    pub impact: ImpactReport,
}

pub struct PullRequestAssembler {
    planner: ChangePlanner,
    model: Arc<dyn CompletionModel>,
    accessor: RepositoryAccessor,
    analyzer: Arc<dyn ImpactAnalyzer>,
    settings: GenerationSettings,
}

impl PullRequestAssembler {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        accessor: RepositoryAccessor,
        retriever: ContextRetriever,
        analyzer: Arc<dyn ImpactAnalyzer>,
        settings: GenerationSettings,
    ) -> Self {
        let planner =
            ChangePlanner::new(model.clone(), accessor.clone(), retriever, settings.clone());
        Self { planner, model, accessor, analyzer, settings }
    }

    /// Plan, synthesize and finalize changes without touching the remote.
    pub async fn prepare(
        &self,
        description: &str,
        context_query: Option<&str>,
    ) -> Result<PreparedChanges> {
        let planning = self.planner.plan(description, context_query).await?;
        let outcome = Synthesis::new(
            self.model.clone(),
            self.settings.completion_model.clone(),
            self.accessor.clone(),
            &planning,
            self.settings.max_files,
        )
        .run()
        .await?;

        let files = finalize_all(&outcome.changes);
        let impact = if files.is_empty() {
            ImpactReport::default()
        } else {
            self.analyzer.analyze(&files).await
        };
        Ok(PreparedChanges { planning, outcome, files, impact })
    }

    /// Open a pull request for `description`. `None` when nothing was
    /// generated.
    pub async fn submit(
        &self,
        description: &str,
        context_query: Option<&str>,
        base_branch: Option<&str>,
    ) -> Result<Option<u64>> {
        let prepared = self.prepare(description, context_query).await?;
        if prepared.files.is_empty() {
            tracing::warn!("No changes were generated; not opening a pull request");
            return Ok(None);
        }

        let title = render_pr_title(self.settings.pr_title_prefix.as_deref(), description);
        let body = render_pr_description(description, &prepared.outcome.changes, &prepared.impact);
        let pull = self
            .accessor
            .create_pull_request(&title, &body, prepared.files, base_branch)
            .await
            .context("Failed creating pull request")?;
        tracing::info!("Created pull request #{} at {}", pull.number, pull.url);
        Ok(Some(pull.number))
    }
}

/// Finalize every change. A path produced more than once keeps its first
/// position and its last content.
pub fn finalize_all(changes: &[FileChangeWithType]) -> Vec<FileChange> {
    let mut files: Vec<FileChange> = Vec::with_capacity(changes.len());
    for change in changes {
        let file = finalize(change);
        match files.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => existing.content = file.content,
            None => files.push(file),
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SymbolImpactAnalyzer;
    use crate::github::PathFilter;
    use crate::testing::{hit, MockHost, ScriptedModel, StaticSearch};

    const LOGIN: &str =
        "import React from 'react';\n\nexport function Login() {\n  return null;\n}\n";
    const PLAN: &str = "1. FILE: src/api/auth.ts\n   ACTION: create\n   PURPOSE: auth client\n\
                        2. FILE: src/login.ts\n   ACTION: modify\n   DEPENDS_ON: src/api/auth.ts\n";
    const AUTH: &str = "export async function authenticate(user: string) {\n  return user;\n}";

    fn assembler(
        host: Arc<MockHost>,
        responses: &[&str],
        settings: GenerationSettings,
    ) -> PullRequestAssembler {
        let accessor = RepositoryAccessor::new(host, PathFilter::allow_all());
        let search = StaticSearch::new(vec![hit("src/login.ts", LOGIN, 0.9)]);
        PullRequestAssembler::new(
            Arc::new(ScriptedModel::new(responses)),
            accessor.clone(),
            ContextRetriever::new(Arc::new(search)),
            Arc::new(SymbolImpactAnalyzer::new(accessor)),
            settings,
        )
    }

    fn login_responses() -> Vec<String> {
        vec![
            PLAN.to_string(),
            format!(
                "FILE: src/api/auth.ts\nACTION: create\nCONTENT:\n```ts\n{AUTH}\n```\nEND_CONTENT"
            ),
            "FILE: src/login.ts\nACTION: modify\nINSERT_AFTER_LINE: 0\nCONTENT:\n\
             import { authenticate } from './api/auth';\nEND_CONTENT"
                .to_string(),
        ]
    }

    #[tokio::test]
    async fn login_form_scenario_opens_pull_request() {
        let host = Arc::new(MockHost::with_files(&[("src/login.ts", LOGIN)]));
        let responses = login_responses();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let assembler = assembler(host.clone(), &refs, GenerationSettings::default());

        let number = assembler
            .submit("Add a login form\n\nUse the auth API.", Some("login form"), None)
            .await
            .expect("submit");
        assert_eq!(number, Some(42));

        let drafts = host.drafts();
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.title, "Add a login form");
        assert_eq!(draft.base_branch, "main");

        let paths: Vec<&str> = draft.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/api/auth.ts", "src/login.ts"]);
        assert_eq!(draft.files[0].content, AUTH);
        assert_eq!(draft.files[1].original_content.as_deref(), Some(LOGIN));
        assert_eq!(
            draft.files[1].content,
            "import React from 'react';\nimport { authenticate } from './api/auth';\n\n\
             export function Login() {\n  return null;\n}\n"
        );

        assert!(draft.body.contains("- `src/api/auth.ts` - New file"));
        assert!(draft.body.contains("- `src/login.ts` - Updated"));
        assert!(draft.body.contains("`authenticate` (function) in `src/api/auth.ts`"));
        assert!(draft
            .body
            .contains("### Affected Symbols\n- `Login` (function) in `src/login.ts`"));
    }

    #[tokio::test]
    async fn empty_plan_opens_nothing() {
        let host = Arc::new(MockHost::default());
        let assembler =
            assembler(host.clone(), &["No files need to change."], GenerationSettings::default());
        let number = assembler.submit("Nothing", None, None).await.expect("submit");
        assert_eq!(number, None);
        assert!(host.drafts().is_empty());
    }

    #[tokio::test]
    async fn pull_request_failure_is_fatal() {
        let host = MockHost {
            fail_pull_request: true,
            ..MockHost::with_files(&[("src/login.ts", LOGIN)])
        };
        let responses = login_responses();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let assembler = assembler(Arc::new(host), &refs, GenerationSettings::default());
        assert!(assembler.submit("Add a login form", None, Some("develop")).await.is_err());
    }

    #[tokio::test]
    async fn title_prefix_and_base_branch_are_used() {
        let host = Arc::new(MockHost::default());
        let settings =
            GenerationSettings { pr_title_prefix: Some("[codegen] ".into()), ..Default::default() };
        let assembler = assembler(
            host.clone(),
            &["FILE: a.py\nACTION: create", "FILE: a.py\nCONTENT:\nx = 1\nEND_CONTENT"],
            settings,
        );
        assembler.submit("Add a", None, Some("develop")).await.expect("submit");
        let draft = &host.drafts()[0];
        assert_eq!(draft.title, "[codegen] Add a");
        assert_eq!(draft.base_branch, "develop");
    }

    #[test]
    fn finalize_all_merges_repeated_paths() {
        let changes = vec![
            FileChangeWithType::create("a.py", "x = 1"),
            FileChangeWithType::create("b.py", "y = 1"),
            FileChangeWithType::modify("a.py", "z = 3", "x = 1", Some(0)),
        ];
        let files = finalize_all(&changes);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].content, "x = 1\nz = 3");
    }
}
