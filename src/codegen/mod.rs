//! Description-to-pull-request pipeline: plan, synthesize, splice, submit.

pub mod assemble;
pub mod parse;
pub mod planner;
pub mod prompts;
pub mod splice;
pub mod synth;

pub use assemble::{PreparedChanges, PullRequestAssembler};
pub use planner::{ChangePlanner, PlanningResult};
pub use synth::{Synthesis, SynthesisAnomaly, SynthesisFailure, SynthesisOutcome, SynthesisStep};

use crate::domain::{Config, DuplicateCreatePolicy};

/// The subset of [`Config`] the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub completion_model: String,
    pub context_limit: usize,
    pub max_files: usize,
    pub duplicate_create_policy: DuplicateCreatePolicy,
    pub pr_title_prefix: Option<String>,
}

impl From<&Config> for GenerationSettings {
    fn from(config: &Config) -> Self {
        Self {
            completion_model: config.completion_model.clone(),
            context_limit: config.context_limit,
            max_files: config.max_files,
            duplicate_create_policy: config.duplicate_create_policy,
            pr_title_prefix: config.pr_title_prefix.clone().filter(|p| !p.is_empty()),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}
