//! Adapter around the external media tool (ffmpeg/ffprobe).
//!
//! Two operations: transcode an engine-native MP3 into the canonical WAV
//! profile, and probe a container's duration. Duration is non-critical
//! metadata, so the probing helper degrades to a fixed fallback instead
//! of failing the request.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Reported duration when the probe fails or emits garbage.
pub const DEFAULT_DURATION_SECS: f64 = 5.0;

/// Canonical WAV profile: mono, 22050 Hz, 16-bit PCM.
pub const WAV_SAMPLE_RATE: u32 = 22_050;
pub const WAV_CHANNELS: u32 = 1;

const FFMPEG_ENV: &str = "SAUTI_FFMPEG_BIN";
const FFPROBE_ENV: &str = "SAUTI_FFPROBE_BIN";

/// Handle on the external transcoding and probing binaries.
#[derive(Debug, Clone)]
pub struct Transcoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Transcoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(env_bin(FFMPEG_ENV, "ffmpeg"), env_bin(FFPROBE_ENV, "ffprobe"))
    }

    /// Convert `source` into a mono 22050 Hz 16-bit PCM WAV at `dest`.
    pub async fn transcode_to_wav(&self, source: &Path, dest: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(source)
            .arg("-ac")
            .arg(WAV_CHANNELS.to_string())
            .arg("-ar")
            .arg(WAV_SAMPLE_RATE.to_string())
            .arg("-acodec")
            .arg("pcm_s16le")
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        debug!(source = %source.display(), dest = %dest.display(), "transcoding to wav");

        let output = cmd
            .output()
            .await
            .map_err(|err| spawn_error(&self.ffmpeg, err))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Transcode(last_line(&stderr)));
        }
        Ok(())
    }

    /// Container duration in seconds, or `DEFAULT_DURATION_SECS` when the
    /// probe fails. Never an error: duration is descriptive metadata.
    pub async fn probe_duration(&self, path: &Path) -> f64 {
        match self.try_probe_duration(path).await {
            Ok(secs) => secs,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "duration probe failed, using fallback");
                DEFAULT_DURATION_SECS
            }
        }
    }

    /// Strict probe: surfaces tool failures. Used where the duration is
    /// the whole point of the request.
    pub async fn try_probe_duration(&self, path: &Path) -> Result<f64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|err| spawn_error(&self.ffprobe, err))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Transcode(last_line(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .ok_or_else(|| Error::Transcode(format!("unparseable probe output: {:?}", stdout.trim())))
    }
}

fn env_bin(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

fn spawn_error(bin: &Path, err: std::io::Error) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::ToolMissing(bin.display().to_string())
    } else {
        Error::Io(err)
    }
}

fn last_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("no tool diagnostics")
        .trim()
        .to_string()
}

/// Human-readable duration, e.g. `"7s"` or `"1m 7s"`.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let minutes = total / 60;
    let seconds = total % 60;
    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
