//! Clip type representing a synthesized speech file.
//!
//! A Clip is a WAV file written after a successful speech request. Clips
//! are identified by a deterministic clip_id computed from the request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::SystemTime;

use super::job::system_time_serde;

/// A synthesized speech file stored on disk.
///
/// Clips are immutable once created. Identical (text, voice, model)
/// requests map to the same `clip_id`, which lets callers reuse the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    /// SHA256 of (text + voice + model), 16 hex characters.
    pub clip_id: String,

    /// Full filesystem path to the WAV file.
    pub path: PathBuf,

    /// Text that was spoken.
    pub text: String,

    /// Prebuilt voice name.
    pub voice: String,

    /// Audio sample rate in Hz, as reported by the provider.
    pub sample_rate: u32,

    /// Duration of the audio in seconds.
    pub duration_sec: f32,

    /// Speech model identifier.
    pub model: String,

    /// When the clip was written.
    #[serde(with = "system_time_serde")]
    pub created_at: SystemTime,
}

impl Clip {
    /// Creates a new Clip; the clip_id is computed from the request fields.
    pub fn new(
        path: PathBuf,
        text: String,
        voice: String,
        model: String,
        sample_rate: u32,
        duration_sec: f32,
    ) -> Self {
        let clip_id = compute_clip_id(&text, &voice, &model);
        Self {
            clip_id,
            path,
            text,
            voice,
            sample_rate,
            duration_sec,
            model,
            created_at: SystemTime::now(),
        }
    }

    /// Returns true if the WAV file is still on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Computes a deterministic clip ID from speech parameters.
///
/// The clip ID is the first 16 hex characters of the SHA256 hash of
/// `{text}:{voice}:{model}`.
pub fn compute_clip_id(text: &str, voice: &str, model: &str) -> String {
    let input = format!("{}:{}:{}", text, voice, model);
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "gemini-2.5-flash-preview-tts";

    #[test]
    fn clip_id_deterministic() {
        let id1 = compute_clip_id("hello", "Kore", MODEL);
        let id2 = compute_clip_id("hello", "Kore", MODEL);
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 16);
    }

    #[test]
    fn clip_id_varies_with_params() {
        let base = compute_clip_id("hello", "Kore", MODEL);
        assert_ne!(base, compute_clip_id("hello", "Puck", MODEL));
        assert_ne!(base, compute_clip_id("goodbye", "Kore", MODEL));
        assert_ne!(base, compute_clip_id("hello", "Kore", "other-model"));
    }

    #[test]
    fn clip_id_hex_format() {
        let id = compute_clip_id("test", "Puck", MODEL);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn new_clip_uses_computed_id() {
        let clip = Clip::new(
            PathBuf::from("/nowhere/a.wav"),
            "hi".to_string(),
            "Kore".to_string(),
            MODEL.to_string(),
            24000,
            1.5,
        );
        assert_eq!(clip.clip_id, compute_clip_id("hi", "Kore", MODEL));
        assert!(!clip.exists());
    }
}
