use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

pub fn home_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home))
}

pub fn evrefund_home() -> Result<PathBuf> {
    Ok(home_dir()?.join(".evrefund"))
}

pub fn ensure_evrefund_home() -> Result<PathBuf> {
    let dir = evrefund_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Where audit logs go unless the settings say otherwise.
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join("evcharging_logs"))
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None if path == "~" => home_dir(),
        None => Ok(PathBuf::from(path)),
    }
}
