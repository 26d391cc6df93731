//! Scoped tracking of a request's temporary files.
//!
//! Every path written while servicing one request is registered with an
//! [`ArtifactSet`]. Deliberate exit paths call [`ArtifactSet::release`];
//! everything else (`?`-returns, panics unwound past the handler, a
//! client dropping a streamed body) is covered by the `Drop` impl, which
//! schedules a deferred best-effort deletion after a short grace delay
//! so a transport still flushing buffered bytes never loses its file.

use std::mem;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

/// Delay between a guard being dropped and its files being deleted.
pub const GRACE_DELAY: Duration = Duration::from_millis(500);

/// The ordered set of filesystem paths created for one request.
///
/// Owned exclusively by the request's handling task; never shared.
#[derive(Debug, Default)]
pub struct ArtifactSet {
    paths: Vec<PathBuf>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a path for cleanup. Tracking a path that is never
    /// actually written is fine: missing files delete silently.
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Delete every tracked path now. Missing files are not errors;
    /// other deletion failures are logged and swallowed, since cleanup
    /// runs after the response outcome is already decided.
    pub async fn release(mut self) {
        let paths = mem::take(&mut self.paths);
        remove_all(&paths).await;
    }
}

impl Drop for ArtifactSet {
    fn drop(&mut self) {
        if self.paths.is_empty() {
            return;
        }
        let paths = mem::take(&mut self.paths);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(GRACE_DELAY).await;
                    remove_all(&paths).await;
                });
            }
            // No runtime (synchronous teardown): delete in place.
            Err(_) => {
                for path in &paths {
                    if let Err(err) = std::fs::remove_file(path) {
                        if err.kind() != std::io::ErrorKind::NotFound {
                            warn!(path = %path.display(), error = %err, "failed to delete artifact");
                        }
                    }
                }
            }
        }
    }
}

async fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        remove_one(path).await;
    }
}

async fn remove_one(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "deleted artifact"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to delete artifact");
        }
    }
}
