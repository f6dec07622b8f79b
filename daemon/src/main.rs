//! genmedia-daemon: image-to-video and text-to-speech client.
//!
//! This binary can run in two modes:
//! - CLI mode: one-shot video or speech generation
//! - Daemon mode: JSON-RPC server over stdio

use std::io::BufRead;
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use genmedia_daemon::cli::{output_path, Cli, Command, KeyAction};
use genmedia_daemon::config::DaemonConfig;
use genmedia_daemon::generation::{run_video_job, PollOptions};
use genmedia_daemon::keystore::{mask_key, KeyStore};
use genmedia_daemon::media::{encode_image_file, write_wav};
use genmedia_daemon::provider::{GeminiClient, SpeechProvider};
use genmedia_daemon::rpc::run_server;
use genmedia_daemon::types::{
    canonical_voice, AspectRatio, GenerationJob, SpeechRequest, VideoRequest, VOICES,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.is_daemon_mode());

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries JSON-RPC in daemon mode.
///
/// CLI runs print their own progress, so they default to warnings only.
fn init_tracing(daemon_mode: bool) {
    let filter = EnvFilter::try_from_env("GENMEDIA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(daemon_mode)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn default_log_level(daemon_mode: bool) -> &'static str {
    if daemon_mode {
        "info"
    } else {
        "warn"
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = DaemonConfig::from_env();
    cli.apply(&mut config);
    if let Some(problem) = config.validate() {
        bail!("invalid configuration: {}", problem);
    }

    match cli.command {
        Some(Command::Video {
            ref image,
            ref prompt,
            aspect_ratio,
            ref output,
            no_download,
        }) => {
            let output = (!no_download).then(|| output_path(output.as_ref(), "mp4"));
            run_video_cli(&config, image, prompt, aspect_ratio.into(), output.as_deref()).await
        }
        Some(Command::Speech {
            ref text,
            ref voice,
            ref output,
        }) => {
            let voice = voice.as_deref().unwrap_or(&config.default_voice);
            run_speech_cli(&config, text, voice, &output_path(output.as_ref(), "wav")).await
        }
        Some(Command::Voices) => {
            print_voices(&config);
            Ok(())
        }
        Some(Command::Key { ref action }) => run_key_command(action),
        Some(Command::Daemon) => run_daemon_mode(config).await,
        None => {
            print_usage();
            Ok(())
        }
    }
}

fn client(config: &DaemonConfig) -> anyhow::Result<GeminiClient> {
    let api_key = config.resolve_api_key(&KeyStore::open_default())?;
    Ok(GeminiClient::new(config, api_key)?)
}

/// Runs a video job in CLI mode.
async fn run_video_cli(
    config: &DaemonConfig,
    image: &Path,
    prompt: &str,
    aspect_ratio: AspectRatio,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    eprintln!("=== genmedia-daemon video ===");
    eprintln!("Image: {}", image.display());
    eprintln!("Prompt: \"{}\"", prompt);
    eprintln!("Aspect ratio: {}", aspect_ratio);
    eprintln!("Model: {}", config.video_model);
    if let Some(path) = output {
        eprintln!("Output: {}", path.display());
    }
    eprintln!();

    let image = encode_image_file(image)
        .with_context(|| format!("loading {}", image.display()))?;
    let request = VideoRequest {
        prompt: prompt.to_string(),
        image,
        aspect_ratio,
    };
    let client = client(config)?;
    let mut job = GenerationJob::new(&request);

    let uri = run_video_job(
        &client,
        &mut job,
        &request,
        PollOptions::from(config),
        |event| eprintln!("{}", event),
    )
    .await?;

    eprintln!();
    eprintln!("Generation complete!");
    eprintln!("  Time: {:.1}s", job.elapsed_sec());
    eprintln!("  Status checks: {}", job.poll_count);
    eprintln!("  URI: {}", uri);

    if let Some(path) = output {
        eprintln!();
        eprintln!("Downloading...");
        let mut last_decile = 0;
        let bytes = client
            .download(&uri, path, |received, total| {
                if total > 0 && received * 10 / total > last_decile {
                    last_decile = received * 10 / total;
                    eprintln!("  {}%", last_decile * 10);
                }
            })
            .await?;
        eprintln!("Saved {} bytes to: {}", bytes, path.display());
    } else {
        println!("{}", uri);
    }

    Ok(())
}

/// Runs speech synthesis in CLI mode.
async fn run_speech_cli(
    config: &DaemonConfig,
    text: &str,
    voice: &str,
    output: &Path,
) -> anyhow::Result<()> {
    let request = SpeechRequest::new(text, voice)?;

    eprintln!("=== genmedia-daemon speech ===");
    eprintln!("Voice: {}", request.voice);
    eprintln!("Model: {}", config.speech_model);
    eprintln!("Output: {}", output.display());
    eprintln!();

    let client = client(config)?;
    let start = Instant::now();
    let pcm = client.synthesize(&request).await?;

    eprintln!("Synthesis complete!");
    eprintln!("  Time: {:.2}s", start.elapsed().as_secs_f32());
    eprintln!("  Audio duration: {:.2}s", pcm.duration_sec());
    eprintln!("  Sample rate: {} Hz", pcm.sample_rate);

    write_wav(&pcm.bytes, output, pcm.sample_rate)?;
    eprintln!("Saved to: {}", output.display());

    Ok(())
}

fn print_voices(config: &DaemonConfig) {
    let default = canonical_voice(&config.default_voice);
    for (name, style) in VOICES {
        let marker = if Some(*name) == default { " (default)" } else { "" };
        println!("{:<14} {}{}", name, style, marker);
    }
}

fn run_key_command(action: &KeyAction) -> anyhow::Result<()> {
    let store = KeyStore::open_default();
    match action {
        KeyAction::Set { key } => {
            let key = match key {
                Some(key) => key.trim().to_string(),
                None => {
                    eprintln!("Enter API key:");
                    let mut line = String::new();
                    std::io::stdin()
                        .lock()
                        .read_line(&mut line)
                        .context("reading key from stdin")?;
                    line.trim().to_string()
                }
            };
            if key.is_empty() {
                bail!("API key must not be empty");
            }
            store.save(&key)?;
            eprintln!("Saved {} to {}", mask_key(&key), store.path().display());
        }
        KeyAction::Clear => {
            store.clear()?;
            eprintln!("Cleared {}", store.path().display());
        }
        KeyAction::Show => match store.load()? {
            Some(key) => eprintln!("{} ({})", mask_key(&key), store.path().display()),
            None => eprintln!("No key stored at {}", store.path().display()),
        },
    }
    Ok(())
}

/// Runs the daemon mode (JSON-RPC server).
async fn run_daemon_mode(config: DaemonConfig) -> anyhow::Result<()> {
    eprintln!("=== genmedia-daemon JSON-RPC Server ===");
    eprintln!("Reading from stdin, writing to stdout.");
    eprintln!("Video model: {}", config.video_model);
    eprintln!("Speech model: {}", config.speech_model);
    eprintln!("Output: {}", config.effective_output_path().display());
    if config.resolve_api_key(&KeyStore::open_default()).is_err() {
        eprintln!("No API key configured: set GENMEDIA_API_KEY or call set_api_key");
    }
    eprintln!();

    run_server(config).await?;
    Ok(())
}

/// Prints usage information.
fn print_usage() {
    eprintln!("genmedia-daemon: image-to-video and text-to-speech");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Video (polls every 5s until the job is done):");
    eprintln!("    genmedia-daemon video --image still.png --prompt \"slow dolly in\" --output clip.mp4");
    eprintln!();
    eprintln!("  Speech (24kHz mono WAV):");
    eprintln!("    genmedia-daemon speech --text \"Hello\" --voice Puck --output hello.wav");
    eprintln!();
    eprintln!("  Daemon mode (JSON-RPC server):");
    eprintln!("    genmedia-daemon daemon");
    eprintln!();
    eprintln!("Run 'genmedia-daemon --help' for full options.");
}
