//! Error types for external-tool invocations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The speech engine process failed or produced no audio.
    #[error("speech engine failed: {0}")]
    Synthesis(String),

    /// The media tool failed to convert or probe an audio file.
    #[error("audio transcode failed: {0}")]
    Transcode(String),

    /// A required external binary could not be spawned.
    #[error("external tool '{0}' is not available")]
    ToolMissing(String),

    #[error("audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}
