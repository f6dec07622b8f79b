//! Command-line interface.
//!
//! One-shot video and speech generation for scripting and testing, key
//! management, and the `daemon` subcommand that starts the JSON-RPC server.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DaemonConfig;
use crate::types::AspectRatio;

/// Output aspect ratio for generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AspectArg {
    /// Widescreen 16:9
    #[default]
    #[value(name = "16:9", alias = "landscape")]
    Landscape,
    /// Vertical 9:16
    #[value(name = "9:16", alias = "portrait")]
    Portrait,
}

impl From<AspectArg> for AspectRatio {
    fn from(arg: AspectArg) -> Self {
        match arg {
            AspectArg::Landscape => AspectRatio::Landscape,
            AspectArg::Portrait => AspectRatio::Portrait,
        }
    }
}

/// genmedia-daemon: image-to-video and text-to-speech client
#[derive(Parser, Debug)]
#[command(name = "genmedia-daemon")]
#[command(about = "Generative media client: image-to-video jobs and text-to-speech clips")]
#[command(version)]
pub struct Cli {
    /// Provider REST endpoint
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Seconds between video status checks
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub poll_interval: Option<u64>,

    /// Give up after this many status checks (0 = never)
    #[arg(long, global = true)]
    pub max_polls: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Animate a still image into a short video
    Video {
        /// Source image (PNG, JPEG, GIF or WebP)
        #[arg(short, long)]
        image: PathBuf,

        /// Description of the motion to generate
        #[arg(short, long)]
        prompt: String,

        /// Output aspect ratio
        #[arg(short, long, value_enum, default_value_t = AspectArg::Landscape)]
        aspect_ratio: AspectArg,

        /// Output MP4 file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the result URI without downloading
        #[arg(long)]
        no_download: bool,
    },

    /// Synthesize speech into a WAV file
    Speech {
        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Prebuilt voice name (see `voices`)
        #[arg(short, long)]
        voice: Option<String>,

        /// Output WAV file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the prebuilt voices
    Voices,

    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Run in daemon mode (JSON-RPC over stdio)
    Daemon,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum KeyAction {
    /// Store a key; read from stdin when omitted
    Set { key: Option<String> },
    /// Delete the stored key
    Clear,
    /// Show the stored key, masked
    Show,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running in daemon mode.
    pub fn is_daemon_mode(&self) -> bool {
        matches!(self.command, Some(Command::Daemon))
    }

    /// Applies command-line overrides on top of the environment config.
    pub fn apply(&self, config: &mut DaemonConfig) {
        if let Some(ref url) = self.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = self.poll_interval {
            config.poll_interval = std::time::Duration::from_secs(secs);
        }
        if let Some(max) = self.max_polls {
            config.max_poll_attempts = max;
        }
    }
}

/// Returns the output path, defaulting to `output.<ext>` in the current directory.
pub fn output_path(output: Option<&PathBuf>, ext: &str) -> PathBuf {
    output
        .cloned()
        .unwrap_or_else(|| PathBuf::from(format!("output.{}", ext)))
}
