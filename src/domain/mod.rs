//! Core domain types shared by indexing, planning, synthesis and PR assembly.

pub mod change;
pub mod chunk;
pub mod config;
pub mod plan;

pub use change::{ChangeType, FileChange, FileChangeWithType};
pub use chunk::{Chunk, ContextItem, SearchHit};
pub use config::{Config, DuplicateCreatePolicy};
pub use plan::{Plan, PlanAction, PlannedFile};
