//! The per-file synthesis loop.
//!
//! Each planned file is requested from the model in plan order. The loop is
//! a finite sequence driven by [`Synthesis::next`]; it ends when the queue is
//! empty or `max_files` changes exist.

use super::parse::parse_change;
use super::planner::PlanningResult;
use super::prompts::SynthesisPrompt;
use super::splice::finalize;
use crate::domain::{ChangeType, FileChangeWithType, PlanAction};
use crate::error::SynthesisFailureKind;
use crate::github::RepositoryAccessor;
use crate::llm::{ChatMessage, CompletionModel};
use anyhow::{Context, Result};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

/// A planned file awaiting synthesis. `id` is its index in the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: usize,
    pub path: String,
    pub action: PlanAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisFailure {
    pub work_id: usize,
    pub path: String,
    pub kind: SynthesisFailureKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisAnomaly {
    /// The model answered for a different file than the one requested.
    PathMismatch { work_id: usize, requested: String, echoed: String },
    /// `INSERT_AFTER_LINE` pointed past the original; it was clamped to the
    /// last line.
    InsertLineOutOfRange { work_id: usize, path: String, requested: usize, clamped: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisStep {
    Produced(FileChangeWithType),
    Failed(SynthesisFailure),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisOutcome {
    pub changes: Vec<FileChangeWithType>,
    pub failures: Vec<SynthesisFailure>,
    pub anomalies: Vec<SynthesisAnomaly>,
    /// Planned paths never attempted because the loop stopped early.
    pub unfinished: Vec<String>,
}

impl SynthesisOutcome {
    /// Change types produced for `path`, in production order.
    pub fn change_types(&self, path: &str) -> Vec<ChangeType> {
        self.changes.iter().filter(|c| c.path == path).map(|c| c.change_type).collect()
    }
}

pub struct Synthesis {
    model: Arc<dyn CompletionModel>,
    model_name: String,
    accessor: RepositoryAccessor,
    plan_text: String,
    context: String,
    existing_files: BTreeSet<String>,
    max_files: usize,
    queue: VecDeque<WorkItem>,
    changes: Vec<FileChangeWithType>,
    failures: Vec<SynthesisFailure>,
    anomalies: Vec<SynthesisAnomaly>,
}

impl Synthesis {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        model_name: impl Into<String>,
        accessor: RepositoryAccessor,
        planning: &PlanningResult,
        max_files: usize,
    ) -> Self {
        let queue = planning
            .plan
            .files
            .iter()
            .enumerate()
            .map(|(id, file)| WorkItem { id, path: file.path.clone(), action: file.action })
            .collect();
        Self {
            model,
            model_name: model_name.into(),
            accessor,
            plan_text: planning.plan.raw.clone(),
            context: planning.context_text(),
            existing_files: planning.existing_files.clone(),
            max_files,
            queue,
            changes: Vec::new(),
            failures: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &WorkItem> {
        self.queue.iter()
    }

    pub fn changes(&self) -> &[FileChangeWithType] {
        &self.changes
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() || self.changes.len() >= self.max_files
    }

    /// Synthesize the next queued file. `Ok(None)` once finished; model
    /// request errors are returned as `Err`.
    pub async fn next(&mut self) -> Result<Option<SynthesisStep>> {
        if self.is_finished() {
            return Ok(None);
        }
        let remaining: Vec<String> = self.queue.iter().map(|w| w.path.clone()).collect();
        let Some(item) = self.queue.pop_front() else {
            return Ok(None);
        };

        let original = self.original_for(&item.path, item.action).await;
        let created: Vec<String> = self.changes.iter().map(|c| c.path.clone()).collect();
        let prompt = SynthesisPrompt {
            path: &item.path,
            action: item.action.as_str(),
            existing_content: original.as_deref(),
            created: &created,
            remaining: &remaining,
            existing_files: &self.existing_files,
            plan: &self.plan_text,
            context: &self.context,
        }
        .render();

        let response = self
            .model
            .complete(&self.model_name, &[ChatMessage::user(prompt)])
            .await
            .with_context(|| format!("Synthesis request for {} failed", item.path))?;

        let parsed = match parse_change(&response) {
            Ok(parsed) => parsed,
            Err(kind) => {
                tracing::warn!("Invalid response format for {}, skipping: {}", item.path, kind);
                let failure = SynthesisFailure { work_id: item.id, path: item.path, kind };
                self.failures.push(failure.clone());
                return Ok(Some(SynthesisStep::Failed(failure)));
            }
        };

        let original = if parsed.path == item.path {
            original
        } else {
            tracing::warn!(
                "Requested {} but the model answered for {}",
                item.path,
                parsed.path
            );
            self.anomalies.push(SynthesisAnomaly::PathMismatch {
                work_id: item.id,
                requested: item.path.clone(),
                echoed: parsed.path.clone(),
            });
            let pending_action = self.take_pending(&parsed.path);
            let hint = parsed.action.or(pending_action).unwrap_or(PlanAction::Unknown);
            self.original_for(&parsed.path, hint).await
        };

        let planned = if parsed.path == item.path { item.action } else { PlanAction::Unknown };
        let action = match parsed.action.filter(|a| *a != PlanAction::Unknown).unwrap_or(planned) {
            PlanAction::Create => ChangeType::Create,
            PlanAction::Modify => ChangeType::Modify,
            PlanAction::Unknown if original.is_some() => ChangeType::Modify,
            PlanAction::Unknown => ChangeType::Create,
        };

        let mut change = match (action, original) {
            (ChangeType::Modify, Some(original)) if !original.is_empty() => {
                FileChangeWithType::modify(
                    parsed.path,
                    parsed.content,
                    original,
                    parsed.insert_after_line,
                )
            }
            (ChangeType::Modify, _) => {
                tracing::info!("No existing content for {}; treating it as new", parsed.path);
                FileChangeWithType::create(parsed.path, parsed.content)
            }
            (ChangeType::Create, _) => FileChangeWithType::create(parsed.path, parsed.content),
        };
        if !change.is_well_formed() {
            self.clamp_insert_line(item.id, &mut change);
        }

        tracing::info!(
            "Generated {} ({}), {} files remaining",
            change.path,
            change.change_type,
            self.queue.len()
        );
        self.changes.push(change.clone());
        Ok(Some(SynthesisStep::Produced(change)))
    }

    /// Drive the loop to completion.
    pub async fn run(mut self) -> Result<SynthesisOutcome> {
        while self.next().await?.is_some() {}
        Ok(self.finish())
    }

    pub fn finish(self) -> SynthesisOutcome {
        let unfinished: Vec<String> = self.queue.into_iter().map(|w| w.path).collect();
        if !unfinished.is_empty() {
            tracing::warn!("Some planned files were not created: {}", unfinished.join(", "));
        }
        SynthesisOutcome {
            changes: self.changes,
            failures: self.failures,
            anomalies: self.anomalies,
            unfinished,
        }
    }

    /// Pull an out-of-range insertion point back to the original's last line.
    fn clamp_insert_line(&mut self, work_id: usize, change: &mut FileChangeWithType) {
        let (Some(original), Some(requested)) =
            (change.original_content.as_deref(), change.insert_after_line)
        else {
            return;
        };
        let clamped = original.lines().count().saturating_sub(1);
        tracing::warn!(
            "INSERT_AFTER_LINE {} is past the end of {} ({} lines); using {}",
            requested,
            change.path,
            clamped + 1,
            clamped
        );
        change.insert_after_line = Some(clamped);
        self.anomalies.push(SynthesisAnomaly::InsertLineOutOfRange {
            work_id,
            path: change.path.clone(),
            requested,
            clamped,
        });
    }

    /// Remove pending work for `path`, returning its planned action.
    fn take_pending(&mut self, path: &str) -> Option<PlanAction> {
        let idx = self.queue.iter().position(|w| w.path == path)?;
        self.queue.remove(idx).map(|w| w.action)
    }

    /// Content `path` has before this change: the session's own version if
    /// it was produced earlier, nothing for planned creates, otherwise the
    /// repository copy.
    async fn original_for(&self, path: &str, action: PlanAction) -> Option<String> {
        if let Some(previous) = self.changes.iter().rev().find(|c| c.path == path) {
            return Some(finalize(previous).content);
        }
        if action == PlanAction::Create {
            return None;
        }
        self.accessor.get_file_content(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::parse::parse_plan;
    use crate::github::PathFilter;
    use crate::testing::{MockHost, ScriptedModel};

    fn planning(raw: &str) -> PlanningResult {
        let plan = parse_plan(raw);
        PlanningResult { plan, context: Vec::new(), existing_files: BTreeSet::new() }
    }

    fn start(
        host: MockHost,
        model: Arc<ScriptedModel>,
        raw_plan: &str,
        max_files: usize,
    ) -> (Synthesis, Arc<MockHost>) {
        let host = Arc::new(host);
        let accessor = RepositoryAccessor::new(host.clone(), PathFilter::allow_all());
        (Synthesis::new(model, "gpt-4", accessor, &planning(raw_plan), max_files), host)
    }

    fn create_response(path: &str, content: &str) -> String {
        format!("FILE: {path}\nACTION: create\nCONTENT:\n{content}\nEND_CONTENT")
    }

    #[tokio::test]
    async fn stops_at_max_files_and_reports_unfinished() {
        let responses: Vec<String> =
            ["a.ts", "b.ts", "c.ts"].iter().map(|p| create_response(p, "x")).collect();
        let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
        let model = Arc::new(ScriptedModel::new(&refs));
        let plan = "FILE: a.ts\nACTION: create\nFILE: b.ts\nACTION: create\n\
                    FILE: c.ts\nACTION: create\nFILE: d.ts\nACTION: create";
        let (synthesis, _) = start(MockHost::default(), model.clone(), plan, 2);
        let outcome = synthesis.run().await.expect("run");

        assert_eq!(outcome.changes.len(), 2);
        assert_eq!(outcome.unfinished, vec!["c.ts", "d.ts"]);
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn missing_content_marker_is_recorded_and_skipped() {
        let model = Arc::new(ScriptedModel::new(&[
            "FILE: a.ts\nSorry, I cannot do that.",
            create_response("b.ts", "export const b = 1;").as_str(),
        ]));
        let plan = "FILE: a.ts\nACTION: create\nFILE: b.ts\nACTION: create";
        let (synthesis, _) = start(MockHost::default(), model, plan, 5);
        let outcome = synthesis.run().await.expect("run");

        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].path, "b.ts");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].path, "a.ts");
        assert_eq!(outcome.failures[0].kind, SynthesisFailureKind::MissingMarker("CONTENT:"));
        assert!(outcome.unfinished.is_empty());
    }

    #[tokio::test]
    async fn planned_create_is_not_fetched_and_modify_gets_original() {
        let host = MockHost::with_files(&[("src/login.ts", "line0\nline1\n")]);
        let model = Arc::new(ScriptedModel::new(&[
            create_response("src/api/auth.ts", "export const auth = 1;").as_str(),
            "FILE: src/login.ts\nACTION: modify\nINSERT_AFTER_LINE: 0\n\
             CONTENT:\nimport a;\nEND_CONTENT",
        ]));
        let plan = "FILE: src/api/auth.ts\nACTION: create\nFILE: src/login.ts\nACTION: modify";
        let (synthesis, host) = start(host, model.clone(), plan, 5);
        let outcome = synthesis.run().await.expect("run");

        assert_eq!(host.fetched(), vec!["src/login.ts"]);
        let login = &outcome.changes[1];
        assert_eq!(login.change_type, ChangeType::Modify);
        assert_eq!(login.original_content.as_deref(), Some("line0\nline1\n"));
        assert_eq!(login.insert_after_line, Some(0));
        assert!(model.prompts()[0].contains("Existing content: New file"));
        assert!(model.prompts()[1].contains("Files already created: src/api/auth.ts"));
    }

    #[tokio::test]
    async fn path_mismatch_completes_requested_and_echoed_items() {
        let model = Arc::new(ScriptedModel::new(&[create_response("b.ts", "b").as_str()]));
        let plan = "FILE: a.ts\nACTION: create\nFILE: b.ts\nACTION: create";
        let (synthesis, _) = start(MockHost::default(), model.clone(), plan, 5);
        let outcome = synthesis.run().await.expect("run");

        assert_eq!(model.prompts().len(), 1);
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].path, "b.ts");
        assert_eq!(
            outcome.anomalies,
            vec![SynthesisAnomaly::PathMismatch {
                work_id: 0,
                requested: "a.ts".into(),
                echoed: "b.ts".into(),
            }]
        );
        assert!(outcome.unfinished.is_empty());
    }

    #[tokio::test]
    async fn modify_without_original_becomes_create() {
        let model = Arc::new(ScriptedModel::new(&[
            "FILE: new.py\nACTION: modify\nINSERT_AFTER_LINE: 3\nCONTENT:\nx = 1\nEND_CONTENT",
        ]));
        let (synthesis, _) =
            start(MockHost::default(), model, "FILE: new.py\nACTION: modify", 5);
        let outcome = synthesis.run().await.expect("run");
        assert_eq!(outcome.changes, vec![FileChangeWithType::create("new.py", "x = 1")]);
    }

    #[tokio::test]
    async fn repeated_target_uses_session_content() {
        let model = Arc::new(ScriptedModel::new(&[
            create_response("a.py", "x = 1").as_str(),
            "FILE: a.py\nACTION: modify\nINSERT_AFTER_LINE: 0\nCONTENT:\ny = 2\nEND_CONTENT",
        ]));
        let (mut synthesis, host) =
            start(MockHost::default(), model, "FILE: a.py\nACTION: create", 5);
        synthesis.queue.push_back(WorkItem {
            id: 1,
            path: "a.py".into(),
            action: PlanAction::Modify,
        });
        let outcome = synthesis.run().await.expect("run");

        assert!(host.fetched().is_empty());
        assert_eq!(outcome.changes[1].original_content.as_deref(), Some("x = 1"));
        assert_eq!(finalize(&outcome.changes[1]).content, "x = 1\ny = 2");
    }

    #[tokio::test]
    async fn insert_line_past_original_is_clamped() {
        let host = MockHost::with_files(&[("src/login.ts", "line0\nline1\n")]);
        let model = Arc::new(ScriptedModel::new(&[
            "FILE: src/login.ts\nACTION: modify\nINSERT_AFTER_LINE: 7\n\
             CONTENT:\nline2\nEND_CONTENT",
        ]));
        let (synthesis, _) = start(host, model, "FILE: src/login.ts\nACTION: modify", 5);
        let outcome = synthesis.run().await.expect("run");

        let login = &outcome.changes[0];
        assert!(login.is_well_formed());
        assert_eq!(login.insert_after_line, Some(1));
        assert_eq!(
            outcome.anomalies,
            vec![SynthesisAnomaly::InsertLineOutOfRange {
                work_id: 0,
                path: "src/login.ts".into(),
                requested: 7,
                clamped: 1,
            }]
        );
        assert_eq!(finalize(login).content, "line0\nline1\nline2\n");
    }

    #[tokio::test]
    async fn remaining_files_include_the_current_target() {
        let model = Arc::new(ScriptedModel::new(&[
            create_response("a.ts", "a").as_str(),
            create_response("b.ts", "b").as_str(),
        ]));
        let plan = "FILE: a.ts\nACTION: create\nFILE: b.ts\nACTION: create";
        let (synthesis, _) = start(MockHost::default(), model.clone(), plan, 5);
        synthesis.run().await.expect("run");

        let prompts = model.prompts();
        assert!(prompts[0].contains("Files still needed: a.ts, b.ts"));
        assert!(prompts[1].contains("Files still needed: b.ts"));
    }

    #[tokio::test]
    async fn change_types_follow_production_order() {
        let model = Arc::new(ScriptedModel::new(&[
            create_response("a.py", "x = 1").as_str(),
            "FILE: a.py\nACTION: modify\nINSERT_AFTER_LINE: 0\nCONTENT:\ny = 2\nEND_CONTENT",
        ]));
        let (mut synthesis, _) =
            start(MockHost::default(), model, "FILE: a.py\nACTION: create", 5);
        synthesis.queue.push_back(WorkItem {
            id: 1,
            path: "a.py".into(),
            action: PlanAction::Modify,
        });
        let outcome = synthesis.run().await.expect("run");

        assert_eq!(outcome.change_types("a.py"), vec![ChangeType::Create, ChangeType::Modify]);
        assert!(outcome.change_types("b.py").is_empty());
    }

    #[tokio::test]
    async fn completion_error_is_fatal() {
        let model = Arc::new(ScriptedModel::new(&[]));
        let (synthesis, _) = start(MockHost::default(), model, "FILE: a.ts", 5);
        assert!(synthesis.run().await.is_err());
    }

    #[tokio::test]
    async fn next_yields_steps_lazily() {
        let model = Arc::new(ScriptedModel::new(&[create_response("a.ts", "a").as_str()]));
        let (mut synthesis, _) =
            start(MockHost::default(), model, "FILE: a.ts\nACTION: create", 5);
        assert_eq!(synthesis.pending().count(), 1);
        let step = synthesis.next().await.expect("step");
        assert!(matches!(step, Some(SynthesisStep::Produced(_))));
        assert!(synthesis.is_finished());
        assert_eq!(synthesis.next().await.expect("step"), None);
    }
}
