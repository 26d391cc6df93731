//! Storage layout and filesystem helpers.
//!
//! Two directories: a scratch dir for per-request temporaries and a
//! durable dir for saved audio. Both default under the platform data
//! dir and can be pointed elsewhere via environment variables.

use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context};

const APP_DIR: &str = "sauti";
const TEMP_ENV: &str = "SAUTI_TEMP_DIR";
const AUDIO_ENV: &str = "SAUTI_AUDIO_DIR";

pub fn resolve_temp_root() -> PathBuf {
    env_path(TEMP_ENV).unwrap_or_else(|| resolve_data_root().join("tmp"))
}

pub fn resolve_audio_root() -> PathBuf {
    env_path(AUDIO_ENV).unwrap_or_else(|| resolve_data_root().join("audio"))
}

pub fn ensure_storage_dirs(temp_root: &Path, audio_root: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(temp_root)
        .with_context(|| format!("Failed to create temp directory: {}", temp_root.display()))?;
    std::fs::create_dir_all(audio_root)
        .with_context(|| format!("Failed to create audio directory: {}", audio_root.display()))?;
    Ok(())
}

/// Validate a client-supplied filename before joining it onto a storage
/// root. Rejects anything that could escape the directory.
pub fn safe_filename(raw: &str) -> anyhow::Result<&str> {
    let candidate = Path::new(raw);
    if raw.is_empty() || candidate.is_absolute() {
        return Err(anyhow!("Unsafe filename: {raw:?}"));
    }
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(raw),
        _ => Err(anyhow!("Unsafe filename: {raw:?}")),
    }
}

fn resolve_data_root() -> PathBuf {
    if let Some(mut dir) = dirs::data_local_dir() {
        dir.push(APP_DIR);
        return dir;
    }
    PathBuf::from("data")
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    })
}
