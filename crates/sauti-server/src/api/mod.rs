//! API routes and handlers

pub mod audio;
pub mod internal;
pub mod request_context;
mod router;
pub mod tts;

pub use router::create_router;
