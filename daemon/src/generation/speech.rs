//! Text-to-speech flow: synthesize, wrap in WAV, save.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::error::Result;
use crate::media::write_wav;
use crate::provider::SpeechProvider;
use crate::types::{compute_clip_id, Clip, SpeechRequest};

/// Synthesizes speech and writes it to `<output_dir>/<clip_id>.wav`.
///
/// `model` only feeds the clip ID; the provider decides which model runs.
pub async fn synthesize_clip<P>(
    provider: &P,
    request: &SpeechRequest,
    output_dir: &Path,
    model: &str,
) -> Result<Clip>
where
    P: SpeechProvider + ?Sized,
{
    let start = Instant::now();
    let pcm = provider.synthesize(request).await?;

    let clip_id = compute_clip_id(&request.text, &request.voice, model);
    let path = output_dir.join(format!("{}.wav", clip_id));
    write_wav(&pcm.bytes, &path, pcm.sample_rate)?;

    let clip = Clip::new(
        path,
        request.text.clone(),
        request.voice.clone(),
        model.to_string(),
        pcm.sample_rate,
        pcm.duration_sec(),
    );

    info!(
        clip_id = %clip.clip_id,
        voice = %clip.voice,
        duration_sec = clip.duration_sec,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Speech clip written"
    );
    Ok(clip)
}
