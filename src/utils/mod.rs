//! Small helpers shared across modules.

pub mod classify;
pub mod encoding;
pub mod hashing;
pub mod paths;
pub mod tokens;

pub use encoding::decode_bytes;
pub use hashing::stable_hash;
pub use paths::{clean_file_path, normalize_path, sanitize_branch_name};
pub use tokens::estimate_tokens;
