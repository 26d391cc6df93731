//! Durable storage for saved audio, addressed by display filename.
//!
//! Artifacts are copied in (never moved) so temporary cleanup stays
//! uniform, staged through a `.tmp` sibling and renamed into place so a
//! concurrent reader never observes a half-written file. The directory
//! is append-only from the service's perspective; only the housekeeping
//! sweep removes entries.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::storage::safe_filename;

#[derive(Debug, Clone)]
pub struct AudioStore {
    root: PathBuf,
}

impl AudioStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute path for a stored filename, after safety checks.
    pub fn entry_path(&self, filename: &str) -> anyhow::Result<PathBuf> {
        Ok(self.root.join(safe_filename(filename)?))
    }

    /// Copy a finished artifact into durable storage under its display
    /// filename. The source stays in place for the artifact manager to
    /// reclaim.
    pub async fn persist(&self, source: &Path, filename: &str) -> anyhow::Result<PathBuf> {
        let dest = self.entry_path(filename)?;
        let staging = self
            .root
            .join(format!("{filename}.{}.tmp", uuid::Uuid::new_v4().simple()));

        tokio::fs::copy(source, &staging)
            .await
            .with_context(|| format!("Failed staging audio copy to {}", staging.display()))?;

        if let Err(err) = tokio::fs::rename(&staging, &dest).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err).with_context(|| {
                format!(
                    "Failed moving audio from '{}' to '{}'",
                    staging.display(),
                    dest.display()
                )
            });
        }

        debug!(filename, path = %dest.display(), "persisted audio");
        Ok(dest)
    }

    /// Open a stored file for streaming. `Ok(None)` when no such entry
    /// exists (or the name is unsafe, which is indistinguishable to a
    /// client from not-found).
    pub async fn open(&self, filename: &str) -> anyhow::Result<Option<(tokio::fs::File, u64)>> {
        let Ok(path) = self.entry_path(filename) else {
            return Ok(None);
        };
        match tokio::fs::File::open(&path).await {
            Ok(file) => {
                let len = file
                    .metadata()
                    .await
                    .with_context(|| format!("Failed to stat stored audio: {}", path.display()))?
                    .len();
                Ok(Some((file, len)))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to open stored audio: {}", path.display())),
        }
    }

    /// Whether a stored entry exists, resolving to its path.
    pub async fn lookup(&self, filename: &str) -> Option<PathBuf> {
        let path = self.entry_path(filename).ok()?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }
}
