//! Name-based classification of remote repository paths.
//!
//! Only paths are available when listing a remote tree, so these checks
//! never touch file content.

const MINIFIED_INDICATORS: &[&str] = &[".min.", ".bundle.", ".packed."];

const VENDOR_DIRS: &[&str] = &[
    "vendor/",
    "vendors/",
    "third_party/",
    "third-party/",
    "thirdparty/",
    "external/",
    "extern/",
    "node_modules/",
];

fn file_name(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_lowercase()
}

pub fn is_minified_name(path: &str) -> bool {
    let name = file_name(path);
    MINIFIED_INDICATORS.iter().any(|indicator| name.contains(indicator))
}

/// Dependency lock files.
pub fn is_lock_file(path: &str) -> bool {
    matches!(
        file_name(path).as_str(),
        "package-lock.json"
            | "yarn.lock"
            | "pnpm-lock.yaml"
            | "poetry.lock"
            | "pipfile.lock"
            | "cargo.lock"
            | "gemfile.lock"
            | "composer.lock"
            | "go.sum"
    )
}

pub fn is_vendored(path: &str) -> bool {
    let normalized = format!("/{}", path.to_lowercase().replace('\\', "/"));
    VENDOR_DIRS.iter().any(|dir| normalized.contains(&format!("/{dir}")))
}

/// Paths that should never be indexed or offered to the planner.
pub fn is_noise(path: &str) -> bool {
    is_lock_file(path) || is_vendored(path) || is_minified_name(path)
}
