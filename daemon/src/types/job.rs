//! GenerationJob type for tracking long-running video requests.
//!
//! A GenerationJob tracks a request from submission through the provider's
//! final status, including the poll count and any error information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use super::request::{AspectRatio, VideoRequest};

/// Opaque reference returned by the provider for a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single status refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// The provider is still working on the job.
    Running,
    /// The job finished and produced a playable URI.
    Done { uri: String },
    /// The job finished with an error reported by the provider.
    Failed { message: String },
}

impl PollStatus {
    /// Returns true if the provider considers the job finished.
    pub fn is_done(&self) -> bool {
        !matches!(self, PollStatus::Running)
    }
}

/// Status of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created locally, not yet accepted by the provider.
    #[default]
    Pending,
    /// Accepted by the provider, no status checked yet.
    Submitted,
    /// At least one status check reported the job as unfinished.
    Running,
    /// Finished with a result URI.
    Complete,
    /// Submission, polling or the job itself failed.
    Failed,
}

impl JobStatus {
    /// Returns true if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

/// A video generation request, tracked from submission through completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Local job identifier (UUID v4).
    pub job_id: String,

    /// Provider handle, set once submission succeeds.
    pub handle: Option<JobHandle>,

    /// Prompt the job was submitted with.
    pub prompt: String,

    /// Aspect ratio the job was submitted with.
    pub aspect_ratio: AspectRatio,

    /// Current job state.
    pub status: JobStatus,

    /// Provider's done flag as of the last status check.
    pub done: bool,

    /// Error reported by the provider or raised locally.
    pub error_message: Option<String>,

    /// Playable URI once the job completes.
    pub result_uri: Option<String>,

    /// Number of status checks made so far.
    pub poll_count: u32,

    /// When the job was created.
    #[serde(with = "system_time_serde")]
    pub created_at: SystemTime,

    /// When the job reached a terminal state.
    #[serde(with = "option_system_time_serde")]
    pub completed_at: Option<SystemTime>,
}

impl GenerationJob {
    /// Creates a new pending job for the given request.
    pub fn new(request: &VideoRequest) -> Self {
        Self {
            job_id: uuid::Uuid::new_v4().to_string(),
            handle: None,
            prompt: request.prompt.clone(),
            aspect_ratio: request.aspect_ratio,
            status: JobStatus::Pending,
            done: false,
            error_message: None,
            result_uri: None,
            poll_count: 0,
            created_at: SystemTime::now(),
            completed_at: None,
        }
    }

    /// Records the handle returned by the provider.
    pub fn set_submitted(&mut self, handle: JobHandle) {
        self.handle = Some(handle);
        self.status = JobStatus::Submitted;
    }

    /// Applies the outcome of one status check.
    pub fn record_poll(&mut self, status: &PollStatus) {
        self.poll_count += 1;
        match status {
            PollStatus::Running => {
                self.status = JobStatus::Running;
            }
            PollStatus::Done { uri } => {
                self.done = true;
                self.result_uri = Some(uri.clone());
                self.status = JobStatus::Complete;
                self.completed_at = Some(SystemTime::now());
            }
            PollStatus::Failed { message } => {
                self.done = true;
                self.set_failed(message);
            }
        }
    }

    /// Marks the job as failed with an error.
    pub fn set_failed(&mut self, message: &str) {
        self.status = JobStatus::Failed;
        self.error_message = Some(message.to_string());
        self.completed_at = Some(SystemTime::now());
    }

    /// Wall-clock seconds between creation and completion (or now).
    pub fn elapsed_sec(&self) -> f32 {
        let end = self.completed_at.unwrap_or_else(SystemTime::now);
        end.duration_since(self.created_at)
            .map(|d| d.as_secs_f32())
            .unwrap_or(0.0)
    }
}

/// Custom serde implementation for SystemTime.
pub(crate) mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

/// Custom serde implementation for Option<SystemTime>.
mod option_system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        time.map(|t| t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs())
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<u64>::deserialize(deserializer)?;
        Ok(opt.map(|secs| UNIX_EPOCH + Duration::from_secs(secs)))
    }
}
