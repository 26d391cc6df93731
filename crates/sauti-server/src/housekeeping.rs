//! Periodic filesystem sweep.
//!
//! Deletes aged files from the temp and audio directories. Idempotent,
//! tolerant of files vanishing mid-sweep; failures are logged and never
//! propagate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_MAX_FILE_AGE_SECS: u64 = 3600;

const SWEEP_INTERVAL_ENV: &str = "SAUTI_SWEEP_INTERVAL_SECS";
const MAX_FILE_AGE_ENV: &str = "SAUTI_MAX_FILE_AGE_SECS";

pub fn sweep_interval_from_env() -> Duration {
    Duration::from_secs(env_secs(SWEEP_INTERVAL_ENV, DEFAULT_SWEEP_INTERVAL_SECS))
}

pub fn max_file_age_from_env() -> Duration {
    Duration::from_secs(env_secs(MAX_FILE_AGE_ENV, DEFAULT_MAX_FILE_AGE_SECS))
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// Spawn the background sweeper over the given directories.
pub fn spawn_sweeper(dirs: Vec<PathBuf>, interval: Duration, max_age: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            for dir in &dirs {
                sweep_dir(dir, max_age).await;
            }
        }
    })
}

/// Delete regular files in `dir` whose mtime is older than `max_age`.
pub async fn sweep_dir(dir: &Path, max_age: Duration) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "sweep could not read directory");
            return;
        }
    };

    let mut deleted = 0usize;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "sweep could not advance directory");
                break;
            }
        };

        let path = entry.path();
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let aged_out = meta
            .modified()
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())
            .map(|age| age >= max_age)
            .unwrap_or(false);
        if !aged_out {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => deleted += 1,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %path.display(), error = %err, "sweep failed to delete file");
            }
        }
    }

    if deleted > 0 {
        debug!(dir = %dir.display(), deleted, "sweep removed aged files");
    }
}
