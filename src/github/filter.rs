//! Include/exclude glob filtering of repository paths.

use crate::utils::classify::is_noise;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// A path passes when it matches an include glob (or there are none),
/// matches no exclude glob, and is not a lock, vendored or minified file.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = if include.is_empty() { None } else { Some(build_globset(include)?) };
        Ok(Self { include, exclude: build_globset(exclude)? })
    }

    /// Accept every path that is not noise.
    pub fn allow_all() -> Self {
        Self { include: None, exclude: GlobSet::empty() }
    }

    pub fn is_match(&self, path: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return false;
            }
        }
        !self.exclude.is_match(path) && !is_noise(path)
    }

    pub fn apply(&self, paths: Vec<String>) -> Vec<String> {
        paths.into_iter().filter(|p| self.is_match(p)).collect()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("Invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
