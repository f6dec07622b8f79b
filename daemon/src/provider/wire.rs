//! Request and response bodies for the generative-media REST API.
//!
//! Video jobs go through `models/{model}:predictLongRunning` and are tracked
//! as long-running operations. Speech goes through
//! `models/{model}:generateContent` with the audio response modality and
//! comes back as base64 PCM in `inlineData`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SAMPLE_RATE;
use crate::error::{DaemonError, Result};
use crate::media::PcmBuffer;
use crate::types::{PollStatus, SpeechRequest, VideoRequest};

// ============================================================================
// Video: predictLongRunning + operations
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub instances: Vec<VideoInstance<'a>>,
    pub parameters: VideoParameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct VideoInstance<'a> {
    pub prompt: &'a str,
    pub image: WireImage<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireImage<'a> {
    pub bytes_base64_encoded: &'a str,
    pub mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters<'a> {
    pub aspect_ratio: &'a str,
    pub sample_count: u32,
}

impl<'a> PredictRequest<'a> {
    pub fn from_request(request: &'a VideoRequest) -> Self {
        Self {
            instances: vec![VideoInstance {
                prompt: &request.prompt,
                image: WireImage {
                    bytes_base64_encoded: &request.image.data_base64,
                    mime_type: &request.image.mime_type,
                },
            }],
            parameters: VideoParameters {
                aspect_ratio: request.aspect_ratio.as_str(),
                sample_count: 1,
            },
        }
    }
}

/// A long-running operation as returned by submit and poll.
#[derive(Debug, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<ApiError>,
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
pub struct VideoRef {
    pub uri: Option<String>,
}

impl Operation {
    /// Interprets the operation as a poll result.
    ///
    /// A finished operation with neither an error nor a sample URI is a
    /// `MISSING_RESULT` error rather than a status.
    pub fn poll_status(&self) -> Result<PollStatus> {
        if let Some(ref error) = self.error {
            return Ok(PollStatus::Failed {
                message: error.describe(),
            });
        }

        if !self.done {
            return Ok(PollStatus::Running);
        }

        let video = self
            .response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref());

        let uri = video
            .and_then(|v| v.generated_samples.first())
            .and_then(|s| s.video.as_ref())
            .and_then(|v| v.uri.clone());

        match uri {
            Some(uri) => Ok(PollStatus::Done { uri }),
            None => {
                let mut err = DaemonError::missing_result(&self.name);
                if let Some(reasons) = video.map(|v| &v.rai_media_filtered_reasons) {
                    if !reasons.is_empty() {
                        err.message = format!("{} (filtered: {})", err.message, reasons.join("; "));
                    }
                }
                Err(err)
            }
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error object used both in operations and in non-2xx response bodies.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiError {
    pub fn describe(&self) -> String {
        match (&self.status, self.message.is_empty()) {
            (Some(status), false) => format!("{} ({})", self.message, status),
            (Some(status), true) => status.clone(),
            (None, false) => self.message.clone(),
            (None, true) => format!("error code {}", self.code),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
}

/// Extracts a readable message from a failed response body.
pub fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("HTTP {}: {}", status, envelope.error.describe()),
        Err(_) if body.trim().is_empty() => format!("HTTP {}", status),
        Err(_) => format!("HTTP {}: {}", status, body.trim()),
    }
}

// ============================================================================
// Speech: generateContent with audio output
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechBody<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TextPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig<'a> {
    pub response_modalities: [&'static str; 1],
    pub speech_config: SpeechConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig<'a> {
    pub voice_config: VoiceConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig<'a> {
    pub prebuilt_voice_config: PrebuiltVoice<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoice<'a> {
    pub voice_name: &'a str,
}

impl<'a> SpeechBody<'a> {
    pub fn from_request(request: &'a SpeechRequest) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![TextPart { text: &request.text }],
            }],
            generation_config: GenerationConfig {
                response_modalities: ["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoice {
                            voice_name: &request.voice,
                        },
                    },
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SpeechResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

impl SpeechResponse {
    /// Decodes the first inline audio part into a PCM buffer.
    pub fn into_pcm(self) -> Result<PcmBuffer> {
        let finish_reason = self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.clone());

        let inline = self
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data)
            .ok_or_else(|| match finish_reason {
                Some(reason) => {
                    DaemonError::speech_failed(format!("no audio returned (finish reason {})", reason))
                }
                None => DaemonError::speech_failed("no audio returned"),
            })?;

        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| DaemonError::speech_failed(format!("invalid base64 audio: {}", e)))?;

        let sample_rate = inline
            .mime_type
            .as_deref()
            .and_then(parse_sample_rate)
            .unwrap_or(DEFAULT_SAMPLE_RATE);

        Ok(PcmBuffer::new(bytes, sample_rate))
    }
}

/// Highest sample rate accepted from the provider.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// Parses `rate=NNNN` out of a MIME type such as `audio/L16;codec=pcm;rate=24000`.
///
/// Rates of zero or above [`MAX_SAMPLE_RATE`] are treated as absent.
pub fn parse_sample_rate(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("rate"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .filter(|rate| (1..=MAX_SAMPLE_RATE).contains(rate))
}
