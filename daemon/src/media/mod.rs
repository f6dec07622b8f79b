//! Media encoding module.
//!
//! Provides the PCM-to-WAV container writer for synthesized speech and
//! inline base64 encoding of source images.

pub mod image;
pub mod wav;

// Re-export commonly used items
pub use image::{detect_mime_type, encode_image_bytes, encode_image_file, MAX_IMAGE_BYTES};
pub use wav::{pcm_duration, pcm_to_wav, write_wav, PcmBuffer, WAV_HEADER_LEN};
