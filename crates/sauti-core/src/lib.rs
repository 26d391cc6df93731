//! Sauti core: adapters around the external speech engine and media tool.
//!
//! The service itself has no synthesis or codec logic. This crate wraps the
//! two external collaborators (a text-to-speech CLI and ffmpeg/ffprobe) as
//! async operations, plus the supporting domain types: the language
//! directory, audio container formats, and the temporary-artifact guard that
//! keeps every request's scratch files accounted for.

pub mod artifact;
pub mod error;
pub mod format;
pub mod language;
pub mod synthesis;
pub mod transcode;

pub use artifact::{ArtifactSet, GRACE_DELAY};
pub use error::{Error, Result};
pub use format::AudioFormat;
pub use language::Language;
pub use synthesis::{SynthesisEngine, MAX_TEXT_CHARS};
pub use transcode::{Transcoder, DEFAULT_DURATION_SECS};
