//! Config file and environment loading

use crate::config::paths::config_root_dir;
use crate::domain::Config;
use crate::error::ConfigError;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use figment::Figment;
use std::path::{Path, PathBuf};

/// Environment variables that override file settings when set and non-empty.
pub const ENV_KEYS: &[&str] = &[
    "GITHUB_TOKEN",
    "OPENAI_API_KEY",
    "GITHUB_OWNER",
    "GITHUB_REPO",
    "DB_PATH",
    "EMBEDDINGS_MODEL",
    "COMPLETION_MODEL",
    "OPENAI_BASE_URL",
    "GITHUB_API_URL",
];

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "REPO_CODEGEN_CONFIG";

/// Load and validate the configuration.
///
/// An explicitly provided file (argument or `REPO_CODEGEN_CONFIG`) must parse;
/// an auto-discovered one that fails to parse is skipped with a warning.
pub fn load_config(config_path: Option<&Path>) -> Result<Config, ConfigError> {
    let explicit = explicit_config_path(config_path);
    let config = load_unvalidated(explicit.as_deref(), config_root_dir(), env_provider())?;
    validate(config)
}

/// The `--config` argument, else `REPO_CODEGEN_CONFIG`.
pub fn explicit_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    config_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
}

/// The file `load_config` would read, if any.
pub fn resolved_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    explicit_config_path(config_path)
        .or_else(|| config_root_dir().and_then(|dir| discover_config(&dir)))
}

/// Load without checking required keys; used by `verify` to report every issue.
pub fn load_unvalidated(
    explicit: Option<&Path>,
    config_dir: Option<PathBuf>,
    env: Env,
) -> Result<Config, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    match explicit {
        Some(path) => {
            figment = merge_file(figment, path)?;
            let config: Config = figment.merge(env).extract().map_err(Box::new)?;
            return Ok(config);
        }
        None => {
            if let Some(path) = config_dir.and_then(|dir| discover_config(&dir)) {
                let checked = merge_file(figment.clone(), &path).and_then(|f| {
                    f.extract::<Config>().map(|_| f).map_err(|e| ConfigError::from(Box::new(e)))
                });
                match checked {
                    Ok(with_file) => figment = with_file,
                    Err(err) => {
                        tracing::warn!(
                            "Failed to parse auto-discovered config {}: {}",
                            path.display(),
                            err
                        );
                    }
                }
            }
        }
    }

    let config: Config = figment.merge(env).extract().map_err(Box::new)?;
    Ok(config)
}

pub fn validate(config: Config) -> Result<Config, ConfigError> {
    let missing = config.missing_required();
    if missing.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Missing(missing))
    }
}

/// Environment overrides, restricted to keys that are set to a non-empty value.
pub fn env_provider() -> Env {
    let present: Vec<&str> = ENV_KEYS
        .iter()
        .copied()
        .filter(|key| std::env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false))
        .collect();
    Env::raw().only(&present)
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => Ok(figment.merge(Toml::file(path))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        other => Err(ConfigError::UnsupportedFormat {
            extension: other.to_string(),
            path: path.display().to_string(),
        }),
    }
}

fn discover_config(config_dir: &Path) -> Option<PathBuf> {
    let candidates = ["config.yml", "config.yaml", "config.toml"];

    for candidate in candidates {
        let path = config_dir.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DuplicateCreatePolicy;
    use std::fs;
    use tempfile::TempDir;

    fn no_env() -> Env {
        Env::raw().only(&[])
    }

    #[test]
    fn test_defaults_when_no_file() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_unvalidated(None, Some(tmp.path().to_path_buf()), no_env()).expect("cfg");
        assert_eq!(cfg.completion_model, "gpt-4");
        assert_eq!(cfg.embeddings_model, "text-embedding-ada-002");
        assert_eq!(cfg.context_limit, 5);
        assert_eq!(cfg.max_files, 5);
    }

    #[test]
    fn test_load_explicit_yaml() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("settings.yml");
        fs::write(
            &path,
            "github_token: tok\nopenai_api_key: key\ngithub_owner: octo\ngithub_repo: demo\nmax_files: 3\nduplicate_create_policy: reject\n",
        )
        .expect("write");

        let cfg = validate(load_unvalidated(Some(&path), None, no_env()).expect("cfg"))
            .expect("valid");
        assert_eq!(cfg.repo_slug(), "octo/demo");
        assert_eq!(cfg.max_files, 3);
        assert_eq!(cfg.duplicate_create_policy, DuplicateCreatePolicy::Reject);
    }

    #[test]
    fn test_load_explicit_toml() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "completion_model = \"gpt-4o\"\nsearch_limit = 7\n").expect("write");

        let cfg = load_unvalidated(Some(&path), None, no_env()).expect("cfg");
        assert_eq!(cfg.completion_model, "gpt-4o");
        assert_eq!(cfg.search_limit, 7);
    }

    #[test]
    fn test_later_layers_override_file() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.yml");
        fs::write(&path, "github_token: from-file\ncompletion_model: file-model\n").expect("write");

        let cfg: Config = merge_file(Figment::from(Serialized::defaults(Config::default())), &path)
            .expect("merge")
            .merge(Serialized::default("github_token", "from-env"))
            .extract()
            .expect("extract");
        assert_eq!(cfg.github_token, "from-env");
        assert_eq!(cfg.completion_model, "file-model");
    }

    #[test]
    fn test_explicit_invalid_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.yml");
        fs::write(&path, "max_files: many\n").expect("write");

        let result = load_unvalidated(Some(&path), None, no_env());
        assert!(result.is_err(), "explicit config with invalid type should return Err");
    }

    #[test]
    fn test_explicit_missing_file_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("absent.yml");
        assert!(load_unvalidated(Some(&path), None, no_env()).is_err());
    }

    #[test]
    fn test_auto_discovered_invalid_config_falls_back() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("config.yml"), "max_files: many\n").expect("write");

        let cfg = load_unvalidated(None, Some(tmp.path().to_path_buf()), no_env())
            .expect("should not error on auto-discovery");
        assert_eq!(cfg.max_files, Config::default().max_files);
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.ini");
        fs::write(&path, "x=1").expect("write");

        let err = load_unvalidated(Some(&path), None, no_env()).expect_err("unsupported");
        assert!(err.to_string().contains("Unsupported config extension '.ini'"));
    }

    #[test]
    fn test_validate_reports_missing_keys() {
        let err = validate(Config::default()).expect_err("missing keys");
        let msg = err.to_string();
        assert!(msg.contains("GITHUB_TOKEN"));
        assert!(msg.contains("OPENAI_API_KEY"));
        assert!(msg.contains("GITHUB_OWNER"));
        assert!(msg.contains("GITHUB_REPO"));
    }
}
