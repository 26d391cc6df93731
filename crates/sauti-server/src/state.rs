//! Shared application state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sauti_core::{SynthesisEngine, Transcoder};

use crate::audio_store::AudioStore;

/// Cloned per request; everything cross-request lives behind an Arc.
/// The only shared mutable state is the sequential file index.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SynthesisEngine>,
    pub transcoder: Arc<Transcoder>,
    pub audio_store: Arc<AudioStore>,
    temp_root: Arc<PathBuf>,
    file_index: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(temp_root: PathBuf, audio_root: PathBuf) -> Self {
        Self::with_engine(
            SynthesisEngine::from_env(),
            Transcoder::from_env(),
            temp_root,
            audio_root,
        )
    }

    /// Build state around explicit tool handles. Lets tests substitute
    /// stub binaries without racing on process environment.
    pub fn with_engine(
        engine: SynthesisEngine,
        transcoder: Transcoder,
        temp_root: PathBuf,
        audio_root: PathBuf,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            transcoder: Arc::new(transcoder),
            audio_store: Arc::new(AudioStore::new(audio_root)),
            temp_root: Arc::new(temp_root),
            file_index: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Fresh scratch path under the temp dir. Uniqueness comes from a
    /// random identifier, never from the sequential index.
    pub fn temp_path(&self, extension: &str) -> PathBuf {
        self.temp_root
            .join(format!("sauti_{}.{extension}", uuid::Uuid::new_v4().simple()))
    }

    /// Next sequential file index, monotonic for the process lifetime.
    /// Seeds display filenames only; restarts may reuse values.
    pub fn next_file_index(&self) -> u64 {
        self.file_index.fetch_add(1, Ordering::Relaxed) + 1
    }
}
