//! Generation provider seam.
//!
//! The poll loop and speech flow only talk to these traits; the concrete
//! HTTP client lives in [`gemini`] and its request/response schema in
//! [`wire`].

pub mod gemini;
pub mod wire;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::media::PcmBuffer;
use crate::types::{JobHandle, PollStatus, SpeechRequest, VideoRequest};

pub use gemini::GeminiClient;

/// A provider that runs image-to-video generation as a long-running job.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Submits a job and returns the provider's handle for it.
    async fn submit(&self, request: &VideoRequest) -> Result<JobHandle>;

    /// Fetches the current status of a submitted job.
    async fn poll(&self, handle: &JobHandle) -> Result<PollStatus>;

    /// Downloads a finished job's result to `dest`, reporting
    /// (received, total) bytes. Returns the number of bytes written.
    async fn fetch_result(
        &self,
        uri: &str,
        dest: &Path,
        on_progress: &(dyn Fn(u64, u64) + Send + Sync),
    ) -> Result<u64>;
}

/// A provider that turns text into raw PCM audio.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<PcmBuffer>;
}
