//! Daemon configuration module.
//!
//! Contains the runtime configuration for the genmedia-daemon: provider
//! endpoint and models, poll timing, and output locations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{DaemonError, Result};
use crate::keystore::KeyStore;
use crate::types::{canonical_voice, DEFAULT_VOICE};

/// Default provider REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default image-to-video model.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Default text-to-speech model.
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Sample rate assumed when the provider does not state one.
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Runtime configuration for the daemon.
///
/// This configuration is typically loaded from environment variables at
/// startup and then adjusted by command-line arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// API key from the environment. The key store is consulted when unset.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Provider REST endpoint, without trailing slash.
    pub base_url: String,

    /// Model used for image-to-video jobs.
    pub video_model: String,

    /// Model used for speech synthesis.
    pub speech_model: String,

    /// Voice used when a speech request does not name one.
    pub default_voice: String,

    /// Fixed delay between status checks.
    pub poll_interval: Duration,

    /// Maximum number of status checks per job; 0 means no limit.
    pub max_poll_attempts: u32,

    /// Directory for generated audio and video files.
    /// If None, uses the platform-specific default location.
    pub output_path: Option<PathBuf>,
}

impl DaemonConfig {
    /// Creates a new DaemonConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a DaemonConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `GENMEDIA_API_KEY` - Provider API key
    /// - `GENMEDIA_BASE_URL` - Provider REST endpoint
    /// - `GENMEDIA_VIDEO_MODEL` - Image-to-video model
    /// - `GENMEDIA_SPEECH_MODEL` - Text-to-speech model
    /// - `GENMEDIA_VOICE` - Default voice name
    /// - `GENMEDIA_POLL_INTERVAL_SECS` - Seconds between status checks
    /// - `GENMEDIA_MAX_POLL_ATTEMPTS` - Status check limit (0 = unlimited)
    /// - `GENMEDIA_OUTPUT_PATH` - Output directory
    ///
    /// Falls back to defaults for unset or invalid variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("GENMEDIA_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }

        if let Ok(url) = std::env::var("GENMEDIA_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Ok(model) = std::env::var("GENMEDIA_VIDEO_MODEL") {
            if !model.trim().is_empty() {
                config.video_model = model.trim().to_string();
            }
        }

        if let Ok(model) = std::env::var("GENMEDIA_SPEECH_MODEL") {
            if !model.trim().is_empty() {
                config.speech_model = model.trim().to_string();
            }
        }

        if let Ok(voice) = std::env::var("GENMEDIA_VOICE") {
            if let Some(voice) = canonical_voice(&voice) {
                config.default_voice = voice.to_string();
            }
        }

        if let Ok(secs_str) = std::env::var("GENMEDIA_POLL_INTERVAL_SECS") {
            if let Ok(secs) = secs_str.parse::<u64>() {
                if secs > 0 && secs <= 300 {
                    config.poll_interval = Duration::from_secs(secs);
                }
            }
        }

        if let Ok(attempts_str) = std::env::var("GENMEDIA_MAX_POLL_ATTEMPTS") {
            if let Ok(attempts) = attempts_str.parse::<u32>() {
                config.max_poll_attempts = attempts;
            }
        }

        if let Ok(path) = std::env::var("GENMEDIA_OUTPUT_PATH") {
            config.output_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Resolves the API key: environment first, then the key store.
    pub fn resolve_api_key(&self, store: &KeyStore) -> Result<String> {
        if let Some(ref key) = self.api_key {
            return Ok(key.clone());
        }
        store.load()?.ok_or_else(DaemonError::missing_api_key)
    }

    /// Returns the effective output path, using platform defaults if not specified.
    pub fn effective_output_path(&self) -> PathBuf {
        if let Some(ref path) = self.output_path {
            path.clone()
        } else {
            default_output_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.base_url.trim().is_empty() {
            return Some("base_url must not be empty".to_string());
        }

        if self.poll_interval.is_zero() {
            return Some("poll_interval must be > 0".to_string());
        }

        if canonical_voice(&self.default_voice).is_none() {
            return Some(format!("unknown default voice: {}", self.default_voice));
        }

        None
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            default_voice: DEFAULT_VOICE.to_string(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 120,
            output_path: None,
        }
    }
}

/// Returns the platform-specific default output path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/genmedia/output
/// - Linux: ~/.cache/genmedia/output
/// - Windows: C:\Users\<user>\AppData\Local\genmedia\cache\output
fn default_output_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "genmedia") {
        proj_dirs.cache_dir().join("output")
    } else {
        // Fallback to current directory
        PathBuf::from("./output")
    }
}
