use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::BridgeConfig,
};

/// Standard config file names, checked in order.
pub const CONFIG_FILENAMES: &[&str] = &[
    "chatbridge.toml",
    "chatbridge.yaml",
    "chatbridge.yml",
    "chatbridge.json",
];

/// Load config from the given path (any supported format), after `${ENV}`
/// substitution.
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = read_substituted(path)?;
    parse_config(&raw, path)
}

/// Load the config as a generic JSON value (used by validation to detect
/// unknown fields before typed parsing).
pub fn load_config_value(path: &Path) -> Result<serde_json::Value> {
    let raw = read_substituted(path)?;
    parse_config_value(&raw, path)
}

/// Resolve the config path: an explicit path wins, otherwise the standard
/// locations are searched.
///
/// Search order:
/// 1. `./chatbridge.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/chatbridge/chatbridge.{toml,yaml,yml,json}` (user-global)
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    find_config_file().ok_or_else(|| Error::NotFound(CONFIG_FILENAMES.join(", ")))
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/chatbridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chatbridge").map(|d| d.config_dir().to_path_buf())
}

fn read_substituted(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loading config");
    Ok(substitute_env(&raw))
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<BridgeConfig> {
    let ctx = || format!("failed to parse {}", path.display());
    match extension(path) {
        "toml" => toml::from_str(raw).with_context(ctx),
        "yaml" | "yml" => serde_yaml::from_str(raw).with_context(ctx),
        "json" => serde_json::from_str(raw).with_context(ctx),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}

pub(crate) fn parse_config_value(raw: &str, path: &Path) -> Result<serde_json::Value> {
    let ctx = || format!("failed to parse {}", path.display());
    match extension(path) {
        "toml" => {
            let v: toml::Value = toml::from_str(raw).with_context(ctx)?;
            serde_json::to_value(v).with_context(ctx)
        },
        "yaml" | "yml" => {
            let v: serde_yaml::Value = serde_yaml::from_str(raw).with_context(ctx)?;
            serde_json::to_value(v).with_context(ctx)
        },
        "json" => serde_json::from_str(raw).with_context(ctx),
        ext => Err(Error::UnsupportedFormat(ext.to_string())),
    }
}
