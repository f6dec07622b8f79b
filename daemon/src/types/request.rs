//! Request types for video and speech generation.

use serde::{Deserialize, Serialize};

use crate::error::{DaemonError, Result};

use super::voice::canonical_voice;

/// Maximum prompt length for video requests, in characters.
pub const MAX_PROMPT_CHARS: usize = 2000;

/// Maximum text length for speech requests, in characters.
pub const MAX_SPEECH_CHARS: usize = 5000;

/// Output aspect ratio for generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    /// 16:9
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    /// Returns the ratio as sent to the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An image carried inline in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Base64 (standard alphabet, padded) image bytes.
    pub data_base64: String,
}

/// Parameters for an image-to-video job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: InlineImage,
    pub aspect_ratio: AspectRatio,
}

impl VideoRequest {
    /// Checks that the prompt is not blank and is at most `MAX_PROMPT_CHARS`
    /// characters. The prompt is sent as given.
    pub fn validate(&self) -> Result<()> {
        validate_text(&self.prompt, MAX_PROMPT_CHARS)
    }
}

/// Parameters for a text-to-speech request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice: String,
}

impl SpeechRequest {
    /// Builds a request, canonicalising the voice name.
    pub fn new(text: impl Into<String>, voice: &str) -> Result<Self> {
        let voice = canonical_voice(voice).ok_or_else(|| DaemonError::invalid_voice(voice))?;
        let request = Self {
            text: text.into(),
            voice: voice.to_string(),
        };
        validate_text(&request.text, MAX_SPEECH_CHARS)?;
        Ok(request)
    }
}

fn validate_text(text: &str, max_chars: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(DaemonError::empty_prompt());
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(DaemonError::prompt_too_long(len, max_chars));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn video(prompt: &str) -> VideoRequest {
        VideoRequest {
            prompt: prompt.to_string(),
            image: InlineImage {
                mime_type: "image/jpeg".to_string(),
                data_base64: String::new(),
            },
            aspect_ratio: AspectRatio::default(),
        }
    }

    #[test]
    fn aspect_ratio_strings() {
        assert_eq!(AspectRatio::Portrait.as_str(), "9:16");
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
        assert_eq!(AspectRatio::default().as_str(), "16:9");
    }

    #[test]
    fn aspect_ratio_serde_uses_ratio_strings() {
        let json = serde_json::to_string(&AspectRatio::Portrait).unwrap();
        assert_eq!(json, "\"9:16\"");
        let parsed: AspectRatio = serde_json::from_str("\"16:9\"").unwrap();
        assert_eq!(parsed, AspectRatio::Landscape);
    }

    #[test]
    fn video_prompt_validation() {
        assert!(video("waves crashing").validate().is_ok());
        assert_eq!(
            video("   ").validate().unwrap_err().code,
            ErrorCode::InvalidPrompt
        );
        let long = "x".repeat(MAX_PROMPT_CHARS + 1);
        assert_eq!(video(&long).validate().unwrap_err().code, ErrorCode::InvalidPrompt);
    }

    #[test]
    fn speech_request_canonicalises_voice() {
        let req = SpeechRequest::new("hello there", "kore").unwrap();
        assert_eq!(req.voice, "Kore");
    }

    #[test]
    fn speech_request_rejects_unknown_voice() {
        let err = SpeechRequest::new("hello", "Nobody").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidVoice);
    }

    #[test]
    fn speech_request_rejects_empty_text() {
        let err = SpeechRequest::new("", "Puck").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPrompt);
    }
}
