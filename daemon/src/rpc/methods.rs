//! JSON-RPC method handlers.
//!
//! Implements the handlers for all supported JSON-RPC methods.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::generation::{run_video_job, synthesize_clip, PollOptions};
use crate::keystore::mask_key;
use crate::media::encode_image_file;
use crate::provider::VideoProvider;
use crate::types::{
    canonical_voice, compute_clip_id, GenerationJob, JobStatus, SpeechRequest, VideoRequest,
    VOICES,
};

use super::server::{Notifier, ServerState};
use super::types::{
    DownloadProgressParams, GenerateVideoParams, GenerateVideoResult, GenerationCompleteParams,
    GenerationErrorParams, GenerationProgressParams, JsonRpcError, ListVoicesResult,
    SetApiKeyParams, SynthesizeSpeechParams, SynthesizeSpeechResult, VoiceInfo,
};

/// Handles a JSON-RPC method call.
pub async fn handle_request(
    method: &str,
    params: serde_json::Value,
    state: &Arc<ServerState>,
) -> std::result::Result<serde_json::Value, JsonRpcError> {
    match method {
        "generate_video" => handle_generate_video(params, state),
        "synthesize_speech" => handle_synthesize_speech(params, state).await,
        "list_voices" => handle_list_voices(state),
        "set_api_key" => handle_set_api_key(params, state),
        "clear_api_key" => handle_clear_api_key(state),
        "ping" => handle_ping(),
        "shutdown" => handle_shutdown(state),
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

fn parse_params<T: DeserializeOwned>(params: serde_json::Value) -> std::result::Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_result<T: Serialize>(value: T) -> std::result::Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

/// Handles the ping method for health checks.
fn handle_ping() -> std::result::Result<serde_json::Value, JsonRpcError> {
    Ok(serde_json::json!({ "status": "ok" }))
}

/// Handles the shutdown method.
fn handle_shutdown(state: &ServerState) -> std::result::Result<serde_json::Value, JsonRpcError> {
    state.shutdown();
    Ok(serde_json::json!({ "status": "shutting_down" }))
}

/// Handles the generate_video method.
///
/// Validation, image loading and provider setup happen before the response;
/// submission and polling run in a background task that reports through
/// notifications.
fn handle_generate_video(
    params: serde_json::Value,
    state: &Arc<ServerState>,
) -> std::result::Result<serde_json::Value, JsonRpcError> {
    let params: GenerateVideoParams = parse_params(params)?;

    let image = encode_image_file(Path::new(&params.image_path))?;
    let request = VideoRequest {
        prompt: params.prompt,
        image,
        aspect_ratio: params.aspect_ratio,
    };
    request.validate()?;

    let providers = state.providers()?;
    let job = GenerationJob::new(&request);
    let job_id = job.job_id.clone();

    let task = VideoTask {
        provider: providers.video,
        job,
        request,
        options: PollOptions::from(&state.config),
        output_dir: params.download.then(|| state.config.effective_output_path()),
        notifier: state.notifier().clone(),
    };
    info!(job_id = %job_id, aspect_ratio = %task.request.aspect_ratio, "Starting video job");
    tokio::spawn(task.run());

    to_result(GenerateVideoResult {
        job_id,
        status: JobStatus::Pending,
    })
}

/// A video job running in the background.
struct VideoTask {
    provider: Arc<dyn VideoProvider>,
    job: GenerationJob,
    request: VideoRequest,
    options: PollOptions,
    output_dir: Option<PathBuf>,
    notifier: Notifier,
}

impl VideoTask {
    async fn run(mut self) {
        let job_id = self.job.job_id.clone();
        let notifier = self.notifier.clone();

        let result = run_video_job(
            self.provider.as_ref(),
            &mut self.job,
            &self.request,
            self.options,
            |event| {
                notifier.send(
                    "generation_progress",
                    GenerationProgressParams {
                        job_id: job_id.clone(),
                        message: event.message(),
                        poll_count: event.poll_count(),
                    },
                );
            },
        )
        .await;

        let outcome = match (result, self.output_dir.clone()) {
            (Ok(uri), Some(dir)) => {
                let saved = self.download(&uri, &dir).await;
                saved.map(|path| (uri, Some(path)))
            }
            (Ok(uri), None) => Ok((uri, None)),
            (Err(e), _) => Err(e),
        };

        match outcome {
            Ok((uri, path)) => notifier.send(
                "generation_complete",
                GenerationCompleteParams {
                    job_id,
                    uri,
                    path: path.map(|p| p.to_string_lossy().to_string()),
                    poll_count: self.job.poll_count,
                    elapsed_sec: self.job.elapsed_sec(),
                },
            ),
            Err(e) => notifier.send(
                "generation_error",
                GenerationErrorParams {
                    job_id,
                    code: e.code.as_str().to_string(),
                    message: e.message,
                },
            ),
        }
    }

    /// Saves the result as `<dir>/<job_id>.mp4`.
    async fn download(&self, uri: &str, dir: &Path) -> Result<PathBuf> {
        let dest = dir.join(format!("{}.mp4", self.job.job_id));
        let last_decile = AtomicU64::new(0);

        let on_progress = |received: u64, total: u64| {
            if total == 0 {
                return;
            }
            let decile = received.saturating_mul(10) / total;
            if decile > last_decile.load(Ordering::Relaxed) {
                last_decile.store(decile, Ordering::Relaxed);
                self.notifier.send(
                    "download_progress",
                    DownloadProgressParams {
                        job_id: self.job.job_id.clone(),
                        bytes_downloaded: received,
                        bytes_total: total,
                    },
                );
            }
        };

        let bytes = self.provider.fetch_result(uri, &dest, &on_progress).await?;
        info!(job_id = %self.job.job_id, bytes, path = %dest.display(), "Video saved");
        Ok(dest)
    }
}

/// Handles the synthesize_speech method.
///
/// Identical (text, voice, model) requests reuse the cached WAV file.
async fn handle_synthesize_speech(
    params: serde_json::Value,
    state: &Arc<ServerState>,
) -> std::result::Result<serde_json::Value, JsonRpcError> {
    let params: SynthesizeSpeechParams = parse_params(params)?;
    let voice = params
        .voice
        .as_deref()
        .unwrap_or(&state.config.default_voice);
    let request = SpeechRequest::new(params.text, voice)?;

    let clip_id = compute_clip_id(&request.text, &request.voice, state.speech_model());
    if let Some(clip) = state.cache.lock().await.get(&clip_id) {
        info!(clip_id = %clip_id, "Reusing cached speech clip");
        return to_result(SynthesizeSpeechResult {
            clip_id: clip.clip_id.clone(),
            path: clip.path.to_string_lossy().to_string(),
            voice: clip.voice.clone(),
            duration_sec: clip.duration_sec,
            sample_rate: clip.sample_rate,
            cached: true,
        });
    }

    let providers = state.providers()?;
    let output_dir = state.config.effective_output_path();
    let clip = synthesize_clip(
        providers.speech.as_ref(),
        &request,
        &output_dir,
        &providers.speech_model,
    )
    .await?;

    let result = SynthesizeSpeechResult {
        clip_id: clip.clip_id.clone(),
        path: clip.path.to_string_lossy().to_string(),
        voice: clip.voice.clone(),
        duration_sec: clip.duration_sec,
        sample_rate: clip.sample_rate,
        cached: false,
    };
    state.cache.lock().await.put(clip);

    to_result(result)
}

/// Handles the list_voices method.
fn handle_list_voices(state: &ServerState) -> std::result::Result<serde_json::Value, JsonRpcError> {
    let default_voice = canonical_voice(&state.config.default_voice)
        .unwrap_or(crate::types::DEFAULT_VOICE)
        .to_string();

    to_result(ListVoicesResult {
        voices: VOICES
            .iter()
            .map(|&(name, style)| VoiceInfo { name, style })
            .collect(),
        default_voice,
    })
}

/// Handles the set_api_key method.
fn handle_set_api_key(
    params: serde_json::Value,
    state: &ServerState,
) -> std::result::Result<serde_json::Value, JsonRpcError> {
    let params: SetApiKeyParams = parse_params(params)?;
    let key = params.api_key.trim();
    if key.is_empty() {
        return Err(JsonRpcError::invalid_params("api_key must not be empty"));
    }

    state.key_store.save(key)?;
    if state.config.api_key.is_some() {
        warn!("GENMEDIA_API_KEY is set and takes precedence over the stored key");
    }

    Ok(serde_json::json!({ "status": "saved", "key": mask_key(key) }))
}

/// Handles the clear_api_key method.
fn handle_clear_api_key(state: &ServerState) -> std::result::Result<serde_json::Value, JsonRpcError> {
    state.key_store.clear()?;
    Ok(serde_json::json!({ "status": "cleared" }))
}
