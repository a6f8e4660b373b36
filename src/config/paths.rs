//! Well-known config and cache locations.

use std::path::PathBuf;

const APP_DIR: &str = "repo-codegen";

/// Directory holding `config.yml` (or `.yaml`/`.toml`).
pub fn config_root_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|dir| PathBuf::from(dir).join(APP_DIR))
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join(APP_DIR));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config").join(APP_DIR))
    }
}

pub fn cache_root_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME") {
            return Some(PathBuf::from(xdg));
        }
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache"))
    }
}

/// Index database used when `db_path` is not configured.
pub fn default_index_path() -> PathBuf {
    cache_root_dir()
        .map(|base| base.join(APP_DIR).join("index.sqlite"))
        .unwrap_or_else(|| PathBuf::from(".repo-codegen").join("index.sqlite"))
}
