//! genmedia-daemon: client for a generative-media provider.
//!
//! This library drives two kinds of generation against a remote provider:
//! long-running image-to-video jobs, which are submitted once and then polled
//! at a fixed interval until done, and text-to-speech requests, whose raw PCM
//! output is wrapped in a WAV container.
//!
//! # Modules
//!
//! - [`generation`]: The submit-and-poll loop and the speech flow
//! - [`provider`]: Provider traits and the HTTP client
//! - [`media`]: PCM-to-WAV encoding and image loading
//! - [`rpc`]: JSON-RPC server for editor integration
//! - [`types`]: Core data types (GenerationJob, Clip, requests)
//! - [`config`]: Runtime configuration (DaemonConfig)
//! - [`error`]: Error types and codes (DaemonError, ErrorCode)
//!
//! # Example
//!
//! ```rust,no_run
//! use genmedia_daemon::{
//!     config::DaemonConfig,
//!     generation::{run_video_job, PollOptions},
//!     keystore::KeyStore,
//!     media::encode_image_file,
//!     provider::GeminiClient,
//!     types::{AspectRatio, GenerationJob, VideoRequest},
//! };
//!
//! # async fn demo() -> genmedia_daemon::Result<()> {
//! let config = DaemonConfig::from_env();
//! let client = GeminiClient::new(&config, config.resolve_api_key(&KeyStore::open_default())?)?;
//!
//! let request = VideoRequest {
//!     prompt: "the lighthouse beam sweeps through fog".to_string(),
//!     image: encode_image_file("lighthouse.png".as_ref())?,
//!     aspect_ratio: AspectRatio::Landscape,
//! };
//! let mut job = GenerationJob::new(&request);
//! let uri = run_video_job(&client, &mut job, &request, PollOptions::from(&config), |event| {
//!     eprintln!("{}", event);
//! })
//! .await?;
//! println!("{}", uri);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod keystore;
pub mod media;
pub mod provider;
pub mod rpc;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::DaemonConfig;
pub use error::{DaemonError, ErrorCode, Result};
pub use media::{pcm_to_wav, PcmBuffer};
pub use types::{compute_clip_id, Clip, GenerationJob, JobHandle, JobStatus, PollStatus};
