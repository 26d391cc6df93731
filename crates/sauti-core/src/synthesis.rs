//! Adapter around the external text-to-speech engine.
//!
//! The engine is a black box: text plus a canonical language code in, an
//! MP3 file at the requested path out. The default binary is `gtts-cli`;
//! any CLI with a compatible argument shape can be substituted via
//! `SAUTI_TTS_BIN`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Maximum text length accepted for a single engine call. Validated
/// upstream; the engine is never asked to chunk longer input.
pub const MAX_TEXT_CHARS: usize = 5000;

const TTS_BIN_ENV: &str = "SAUTI_TTS_BIN";
const DEFAULT_TTS_BIN: &str = "gtts-cli";

/// Handle on the external speech engine binary.
#[derive(Debug, Clone)]
pub struct SynthesisEngine {
    bin: PathBuf,
}

impl SynthesisEngine {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// Resolve the engine binary from `SAUTI_TTS_BIN`, falling back to
    /// `gtts-cli` on the PATH.
    pub fn from_env() -> Self {
        let bin = std::env::var(TTS_BIN_ENV)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_TTS_BIN.to_string());
        Self::new(bin)
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Synthesize `text` into an MP3 file at `dest`.
    ///
    /// Text is piped over stdin (a single call, no chunking) so argv
    /// length limits never apply. On success the file at `dest` is
    /// guaranteed to exist and be non-empty.
    pub async fn synthesize(&self, text: &str, language_code: &str, dest: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("-l")
            .arg(language_code)
            .arg("-o")
            .arg(dest)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(
            bin = %self.bin.display(),
            language = language_code,
            chars = text.chars().count(),
            "invoking speech engine"
        );

        let mut child = cmd.spawn().map_err(|err| self.spawn_error(err))?;
        if let Some(mut stdin) = child.stdin.take() {
            // An engine that dies before draining stdin closes the pipe;
            // the exit status below carries the real failure.
            if let Err(err) = write_text(&mut stdin, text).await {
                if err.kind() != ErrorKind::BrokenPipe {
                    return Err(Error::Io(err));
                }
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Synthesis(stderr.trim().to_string()));
        }

        match tokio::fs::metadata(dest).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(Error::Synthesis("engine produced an empty audio file".into())),
            Err(_) => Err(Error::Synthesis("engine produced no audio file".into())),
        }
    }

    fn spawn_error(&self, err: std::io::Error) -> Error {
        if err.kind() == ErrorKind::NotFound {
            Error::ToolMissing(self.bin.display().to_string())
        } else {
            Error::Io(err)
        }
    }
}

async fn write_text(stdin: &mut tokio::process::ChildStdin, text: &str) -> std::io::Result<()> {
    stdin.write_all(text.as_bytes()).await?;
    stdin.shutdown().await
}
