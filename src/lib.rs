//! repo-codegen: index a GitHub repository for semantic search and turn
//! natural-language task descriptions into pull requests.
//!
//! The pipeline plans the files to touch, synthesizes each one with a chat
//! completion model, splices incremental edits into the existing sources and
//! opens a pull request through the GitHub REST API.

pub mod analysis;
pub mod chunk;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod domain;
pub mod error;
pub mod github;
pub mod index;
pub mod lang;
pub mod llm;
pub mod render;
pub mod retrieve;
pub mod utils;

#[cfg(test)]
mod testing;
