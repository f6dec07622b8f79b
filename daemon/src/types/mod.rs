//! Core types for the genmedia-daemon.
//!
//! This module re-exports all the core data types used throughout the daemon:
//! - [`GenerationJob`]: A long-running video request with status tracking
//! - [`VideoRequest`] / [`SpeechRequest`]: Validated generation parameters
//! - [`Clip`]: A synthesized speech file saved to disk

mod clip;
mod job;
mod request;
mod voice;

// Re-export all types at the module level
pub use clip::{compute_clip_id, Clip};
pub use job::{GenerationJob, JobHandle, JobStatus, PollStatus};
pub use request::{
    AspectRatio, InlineImage, SpeechRequest, VideoRequest, MAX_PROMPT_CHARS, MAX_SPEECH_CHARS,
};
pub use voice::{canonical_voice, DEFAULT_VOICE, VOICES};
