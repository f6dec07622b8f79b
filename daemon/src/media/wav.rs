//! WAV container writer for synthesized speech.
//!
//! The provider returns headerless 16-bit little-endian mono PCM. This
//! module wraps it in a canonical 44-byte RIFF/WAVE header without touching
//! the samples.

use std::path::Path;

use crate::error::{DaemonError, Result};

/// Size of the RIFF + fmt + data chunk headers.
pub const WAV_HEADER_LEN: usize = 44;

/// Number of audio channels (mono).
pub const CHANNELS: u16 = 1;

/// Bits per sample.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Block align for 16-bit mono.
const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;

/// WAVE_FORMAT_PCM.
const FORMAT_PCM: u16 = 1;

/// Raw 16-bit LE mono samples as produced by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub bytes: Vec<u8>,
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(bytes: Vec<u8>, sample_rate: u32) -> Self {
        Self { bytes, sample_rate }
    }

    /// Duration of the buffer in seconds.
    pub fn duration_sec(&self) -> f32 {
        pcm_duration(self.bytes.len(), self.sample_rate)
    }
}

/// Wraps raw PCM bytes in a RIFF/WAVE container.
///
/// The payload is copied verbatim, so the `data` chunk size always equals
/// `pcm.len()` and the RIFF size is `36 + pcm.len()`. Header fields that
/// would not fit in 32 bits saturate at `u32::MAX`.
///
/// # Example
///
/// ```
/// use genmedia_daemon::media::pcm_to_wav;
///
/// let wav = pcm_to_wav(&[0x00, 0x01], 24000);
/// assert_eq!(wav.len(), 46);
/// assert_eq!(&wav[40..44], &2u32.to_le_bytes());
/// ```
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    let data_len = u32::try_from(pcm.len()).unwrap_or(u32::MAX);
    let byte_rate = sample_rate.saturating_mul(BLOCK_ALIGN as u32);

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Writes raw PCM to a WAV file, creating parent directories as needed.
pub fn write_wav(pcm: &[u8], path: &Path, sample_rate: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DaemonError::output_write_failed(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    std::fs::write(path, pcm_to_wav(pcm, sample_rate)).map_err(|e| {
        DaemonError::output_write_failed(format!(
            "Failed to write WAV file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Calculates the duration in seconds of a 16-bit mono PCM byte count.
pub fn pcm_duration(byte_len: usize, sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    (byte_len / BLOCK_ALIGN as usize) as f32 / sample_rate as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn le_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn le_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn two_byte_example() {
        let wav = pcm_to_wav(&[0x00, 0x01], 24000);
        assert_eq!(wav.len(), 46);
        assert_eq!(le_u32(&wav, 40), 2);
        assert_eq!(le_u32(&wav, 4), 38);
        assert_eq!(&wav[44..], &[0x00, 0x01]);
    }

    #[test]
    fn header_fields() {
        let wav = pcm_to_wav(&[0u8; 10], 24000);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(le_u32(&wav, 16), 16);
        assert_eq!(le_u16(&wav, 20), 1);
        assert_eq!(le_u16(&wav, 22), 1);
        assert_eq!(le_u32(&wav, 24), 24000);
        assert_eq!(le_u32(&wav, 28), 48000);
        assert_eq!(le_u16(&wav, 32), 2);
        assert_eq!(le_u16(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn sizes_track_payload_length() {
        for len in [0usize, 1, 3, 480, 4801] {
            let pcm: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let wav = pcm_to_wav(&pcm, 16000);
            assert_eq!(wav.len(), WAV_HEADER_LEN + len);
            assert_eq!(le_u32(&wav, 4) as usize, 36 + len);
            assert_eq!(le_u32(&wav, 40) as usize, len);
        }
    }

    #[test]
    fn oversized_rate_saturates_byte_rate() {
        let wav = pcm_to_wav(&[0x00, 0x01], u32::MAX);
        assert_eq!(wav.len(), 46);
        assert_eq!(le_u32(&wav, 24), u32::MAX);
        assert_eq!(le_u32(&wav, 28), u32::MAX);
        assert_eq!(le_u32(&wav, 4), 38);
    }

    #[test]
    fn encoding_is_deterministic() {
        let pcm = vec![7u8, 1, 250, 3, 9, 9];
        assert_eq!(pcm_to_wav(&pcm, 24000), pcm_to_wav(&pcm, 24000));
    }

    #[test]
    fn output_reads_back_with_hound() {
        let samples: [i16; 4] = [0, 1000, -1000, i16::MAX];
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let wav = pcm_to_wav(&pcm, 24000);

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 24000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn write_wav_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("clip.wav");

        write_wav(&[1, 0, 2, 0], &path, 24000).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, pcm_to_wav(&[1, 0, 2, 0], 24000));
    }

    #[test]
    fn duration_calculation() {
        assert_eq!(pcm_duration(48000, 24000), 1.0);
        assert_eq!(pcm_duration(24000, 24000), 0.5);
        assert_eq!(pcm_duration(100, 0), 0.0);
        let buffer = PcmBuffer::new(vec![0; 96000], 24000);
        assert_eq!(buffer.duration_sec(), 2.0);
    }
}
