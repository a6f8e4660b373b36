//! Configuration loading
//!
//! Handles loading from config files and environment variables with proper
//! precedence (Env > File > Defaults).

pub mod loader;
pub mod paths;

pub use loader::{load_config, load_unvalidated, resolved_config_path};
pub use paths::{cache_root_dir, config_root_dir, default_index_path};
