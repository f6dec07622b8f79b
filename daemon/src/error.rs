//! Error types for the genmedia-daemon.
//!
//! Defines all error codes and types used throughout the daemon for
//! consistent error handling and reporting.

use std::fmt;

/// Error codes returned by the daemon in error responses.
///
/// These codes are used in JSON-RPC error responses and allow clients
/// to programmatically handle specific error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The provider rejected or failed the job submission.
    SubmissionFailed,

    /// A status refresh for a submitted job failed.
    PollingFailed,

    /// The provider finished the job and reported an error for it.
    JobReportedError,

    /// The job finished without any result attached.
    MissingResult,

    /// The job did not finish within the configured number of polls.
    PollTimeout,

    /// No API key in the environment or the key store.
    MissingApiKey,

    /// Prompt or speech text is empty or too long.
    InvalidPrompt,

    /// Source image is unreadable, empty, too large or of an unknown type.
    InvalidImage,

    /// Requested voice is not one of the prebuilt voices.
    InvalidVoice,

    /// Speech synthesis request failed or returned no audio.
    SpeechFailed,

    /// Fetching the finished video failed.
    DownloadFailed,

    /// Writing an output file failed.
    OutputWriteFailed,

    /// Reading or writing the stored API key failed.
    KeyStoreFailed,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::SubmissionFailed => "SUBMISSION_FAILED",
            ErrorCode::PollingFailed => "POLLING_FAILED",
            ErrorCode::JobReportedError => "JOB_REPORTED_ERROR",
            ErrorCode::MissingResult => "MISSING_RESULT",
            ErrorCode::PollTimeout => "POLL_TIMEOUT",
            ErrorCode::MissingApiKey => "MISSING_API_KEY",
            ErrorCode::InvalidPrompt => "INVALID_PROMPT",
            ErrorCode::InvalidImage => "INVALID_IMAGE",
            ErrorCode::InvalidVoice => "INVALID_VOICE",
            ErrorCode::SpeechFailed => "SPEECH_FAILED",
            ErrorCode::DownloadFailed => "DOWNLOAD_FAILED",
            ErrorCode::OutputWriteFailed => "OUTPUT_WRITE_FAILED",
            ErrorCode::KeyStoreFailed => "KEY_STORE_FAILED",
        }
    }

    /// JSON-RPC error code for this error.
    pub fn rpc_code(&self) -> i32 {
        match self {
            ErrorCode::SubmissionFailed => -32000,
            ErrorCode::PollingFailed => -32001,
            ErrorCode::JobReportedError => -32002,
            ErrorCode::MissingResult => -32003,
            ErrorCode::PollTimeout => -32004,
            ErrorCode::MissingApiKey => -32005,
            ErrorCode::InvalidPrompt => -32006,
            ErrorCode::InvalidImage => -32007,
            ErrorCode::InvalidVoice => -32008,
            ErrorCode::SpeechFailed => -32009,
            ErrorCode::DownloadFailed => -32010,
            ErrorCode::OutputWriteFailed => -32011,
            ErrorCode::KeyStoreFailed => -32012,
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::SubmissionFailed => {
                "Check that the API key is valid and has access to the video model, \
                 then submit again"
            }
            ErrorCode::PollingFailed => {
                "Check your network connection. The job may still be running on the \
                 provider side, but it has to be submitted again to track it here"
            }
            ErrorCode::JobReportedError => {
                "Adjust the prompt or source image; the provider refused or failed the job"
            }
            ErrorCode::MissingResult => {
                "The provider finished without a video, often because of safety filtering. \
                 Try a different prompt or image"
            }
            ErrorCode::PollTimeout => {
                "Raise GENMEDIA_MAX_POLL_ATTEMPTS, or set it to 0 to wait indefinitely"
            }
            ErrorCode::MissingApiKey => {
                "Set GENMEDIA_API_KEY or store a key with `genmedia-daemon key set <KEY>`"
            }
            ErrorCode::InvalidPrompt => "Provide non-empty text within the length limit",
            ErrorCode::InvalidImage => {
                "Use a PNG, JPEG, GIF or WebP image no larger than 20 MiB"
            }
            ErrorCode::InvalidVoice => {
                "Run `genmedia-daemon voices` to list the available voice names"
            }
            ErrorCode::SpeechFailed => {
                "Check the API key and speech model, or shorten the text and try again"
            }
            ErrorCode::DownloadFailed => {
                "The result URI may have expired; generate the video again"
            }
            ErrorCode::OutputWriteFailed => {
                "Check that the output directory exists and is writable"
            }
            ErrorCode::KeyStoreFailed => {
                "Check permissions on the configuration directory"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for daemon operations.
#[derive(Debug)]
pub struct DaemonError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DaemonError {
    /// Creates a new DaemonError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new DaemonError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a SUBMISSION_FAILED error.
    pub fn submission_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SubmissionFailed,
            format!("Job submission failed: {}", reason.into()),
        )
    }

    /// Creates a POLLING_FAILED error.
    pub fn polling_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::PollingFailed,
            format!("Job status check failed: {}", reason.into()),
        )
    }

    /// Creates a JOB_REPORTED_ERROR error carrying the provider's message verbatim.
    pub fn job_reported_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::JobReportedError, message)
    }

    /// Creates a MISSING_RESULT error.
    pub fn missing_result(handle: &str) -> Self {
        Self::new(
            ErrorCode::MissingResult,
            format!("Job {} completed without a result", handle),
        )
    }

    /// Creates a POLL_TIMEOUT error.
    pub fn poll_timeout(handle: &str, attempts: u32) -> Self {
        Self::new(
            ErrorCode::PollTimeout,
            format!("Job {} still running after {} status checks", handle, attempts),
        )
    }

    /// Creates a MISSING_API_KEY error.
    pub fn missing_api_key() -> Self {
        Self::new(ErrorCode::MissingApiKey, "No API key configured")
    }

    /// Creates an INVALID_PROMPT error for empty text.
    pub fn empty_prompt() -> Self {
        Self::new(ErrorCode::InvalidPrompt, "Prompt cannot be empty")
    }

    /// Creates an INVALID_PROMPT error for text that is too long.
    pub fn prompt_too_long(len: usize, max: usize) -> Self {
        Self::new(
            ErrorCode::InvalidPrompt,
            format!("Prompt too long: {} characters (maximum {})", len, max),
        )
    }

    /// Creates an INVALID_IMAGE error.
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidImage,
            format!("Invalid source image: {}", reason.into()),
        )
    }

    /// Creates an INVALID_VOICE error.
    pub fn invalid_voice(voice: &str) -> Self {
        Self::new(ErrorCode::InvalidVoice, format!("Unknown voice: {}", voice))
    }

    /// Creates a SPEECH_FAILED error.
    pub fn speech_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SpeechFailed,
            format!("Speech synthesis failed: {}", reason.into()),
        )
    }

    /// Creates a DOWNLOAD_FAILED error.
    pub fn download_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DownloadFailed,
            format!("Failed to download result: {}", reason.into()),
        )
    }

    /// Creates an OUTPUT_WRITE_FAILED error.
    pub fn output_write_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::OutputWriteFailed,
            format!("Failed to write output: {}", reason.into()),
        )
    }

    /// Creates a KEY_STORE_FAILED error.
    pub fn key_store_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::KeyStoreFailed,
            format!("Key store error: {}", reason.into()),
        )
    }
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}. Recovery: {}",
            self.code,
            self.message,
            self.code.recovery_hint()
        )
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using DaemonError.
pub type Result<T> = std::result::Result<T, DaemonError>;
