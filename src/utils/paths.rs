//! Repository path and branch-name normalization

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED_PATH_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9/._\-]").expect("valid path charset regex"));

static BRANCH_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid branch slug regex"));

/// Forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

/// Clean a path echoed by the model: drop backticks, unify separators and
/// remove everything outside `[A-Za-z0-9/._-]`.
pub fn clean_file_path(raw: &str) -> String {
    let without_ticks = raw.replace('`', "");
    let unified = normalize_path(&without_ticks);
    DISALLOWED_PATH_CHARS.replace_all(&unified, "").into_owned()
}

/// Lowercase, dash-separated slug usable inside a git ref.
pub fn sanitize_branch_name(title: &str) -> String {
    let lower = title.to_lowercase();
    let slug = BRANCH_UNSAFE.replace_all(&lower, "-");
    let trimmed = slug.trim_matches('-');
    let limited: String = trimmed.chars().take(40).collect();
    let limited = limited.trim_end_matches('-');
    if limited.is_empty() {
        "changes".to_string()
    } else {
        limited.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src\\app\\main.ts"), "src/app/main.ts");
        assert_eq!(normalize_path("./src/lib.rs"), "src/lib.rs");
        assert_eq!(normalize_path("/README.md"), "README.md");
    }

    #[test]
    fn test_clean_file_path() {
        assert_eq!(clean_file_path("`src/login.ts`"), "src/login.ts");
        assert_eq!(clean_file_path("src\\components\\Form.tsx"), "src/components/Form.tsx");
        assert_eq!(clean_file_path("src/my file(1).py"), "src/myfile1.py");
        assert_eq!(clean_file_path("**src/a-b_c.rs**"), "src/a-b_c.rs");
    }

    #[test]
    fn test_sanitize_branch_name() {
        assert_eq!(sanitize_branch_name("Add login form!"), "add-login-form");
        assert_eq!(sanitize_branch_name("  ***  "), "changes");
        assert!(sanitize_branch_name(&"x".repeat(100)).len() <= 40);
    }
}
