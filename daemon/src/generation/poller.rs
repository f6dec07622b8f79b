//! Submit-and-poll loop for long-running video jobs.
//!
//! The loop submits once, then alternates a fixed wait with a status check
//! until the provider sets its done flag. There is no backoff, jitter or
//! retry: any submit or poll error ends the job and is returned as-is.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::DaemonConfig;
use crate::error::{DaemonError, Result};
use crate::provider::VideoProvider;
use crate::types::{GenerationJob, PollStatus, VideoRequest};

use super::progress::ProgressEvent;

/// Timing for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Fixed delay before each status check.
    pub interval: Duration,
    /// Maximum number of status checks; 0 means no limit.
    pub max_attempts: u32,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
        }
    }
}

impl From<&DaemonConfig> for PollOptions {
    fn from(config: &DaemonConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        }
    }
}

impl PollOptions {
    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}

/// Runs a video job to completion and returns the playable URI.
///
/// `job` is updated in place as the job progresses and is left in a
/// terminal state whether the call succeeds or fails. `on_progress` is
/// called after submission, before every wait, and once on success.
pub async fn run_video_job<P, F>(
    provider: &P,
    job: &mut GenerationJob,
    request: &VideoRequest,
    options: PollOptions,
    mut on_progress: F,
) -> Result<String>
where
    P: VideoProvider + ?Sized,
    F: FnMut(&ProgressEvent),
{
    let result = drive(provider, job, request, options, &mut on_progress).await;
    if let Err(ref e) = result {
        warn!(job_id = %job.job_id, code = %e.code, "Video job failed: {}", e.message);
        if !job.status.is_terminal() {
            job.set_failed(&e.message);
        }
    }
    result
}

async fn drive<P, F>(
    provider: &P,
    job: &mut GenerationJob,
    request: &VideoRequest,
    options: PollOptions,
    on_progress: &mut F,
) -> Result<String>
where
    P: VideoProvider + ?Sized,
    F: FnMut(&ProgressEvent),
{
    request.validate()?;

    let handle = provider.submit(request).await?;
    info!(job_id = %job.job_id, handle = %handle, "Video job submitted");
    job.set_submitted(handle.clone());
    on_progress(&ProgressEvent::Submitted {
        handle: handle.to_string(),
    });

    loop {
        if options.exhausted(job.poll_count) {
            return Err(DaemonError::poll_timeout(handle.as_str(), job.poll_count));
        }

        on_progress(&ProgressEvent::Waiting {
            poll_count: job.poll_count,
            next_check: options.interval,
        });
        tokio::time::sleep(options.interval).await;

        let status = provider.poll(&handle).await?;
        job.record_poll(&status);
        debug!(job_id = %job.job_id, poll = job.poll_count, done = status.is_done(), "Polled video job");

        match status {
            PollStatus::Running => continue,
            PollStatus::Done { uri } => {
                info!(job_id = %job.job_id, polls = job.poll_count, "Video job complete");
                on_progress(&ProgressEvent::Done {
                    poll_count: job.poll_count,
                });
                return Ok(uri);
            }
            PollStatus::Failed { message } => {
                return Err(DaemonError::job_reported_error(message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{AspectRatio, InlineImage, JobHandle, JobStatus};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Provider that replays scripted poll responses.
    struct ScriptedProvider {
        submit_error: Option<ErrorCode>,
        responses: Mutex<VecDeque<Result<PollStatus>>>,
        polls: AtomicU32,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<PollStatus>>) -> Self {
            Self {
                submit_error: None,
                responses: Mutex::new(responses.into()),
                polls: AtomicU32::new(0),
            }
        }

        fn failing_submit() -> Self {
            Self {
                submit_error: Some(ErrorCode::SubmissionFailed),
                ..Self::new(Vec::new())
            }
        }

        fn polls(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VideoProvider for ScriptedProvider {
        async fn submit(&self, _request: &VideoRequest) -> Result<JobHandle> {
            match self.submit_error {
                Some(_) => Err(DaemonError::submission_failed("HTTP 403: API key not valid")),
                None => Ok(JobHandle::new("models/veo/operations/test")),
            }
        }

        async fn poll(&self, _handle: &JobHandle) -> Result<PollStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(PollStatus::Running))
        }

        async fn fetch_result(
            &self,
            _uri: &str,
            _dest: &std::path::Path,
            _on_progress: &(dyn Fn(u64, u64) + Send + Sync),
        ) -> Result<u64> {
            Ok(0)
        }
    }

    fn request() -> VideoRequest {
        VideoRequest {
            prompt: "a paper boat drifting down a rainy street".to_string(),
            image: InlineImage {
                mime_type: "image/png".to_string(),
                data_base64: "AAAA".to_string(),
            },
            aspect_ratio: AspectRatio::Landscape,
        }
    }

    fn fast(max_attempts: u32) -> PollOptions {
        PollOptions {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    fn done(uri: &str) -> Result<PollStatus> {
        Ok(PollStatus::Done {
            uri: uri.to_string(),
        })
    }

    #[tokio::test]
    async fn polls_until_done() {
        let provider = ScriptedProvider::new(vec![
            Ok(PollStatus::Running),
            Ok(PollStatus::Running),
            done("https://example.com/video.mp4"),
        ]);
        let request = request();
        let mut job = GenerationJob::new(&request);

        let uri = run_video_job(&provider, &mut job, &request, fast(0), |_| {})
            .await
            .unwrap();

        assert_eq!(uri, "https://example.com/video.mp4");
        assert_eq!(provider.polls(), 3);
        assert_eq!(job.poll_count, 3);
        assert_eq!(job.status, JobStatus::Complete);
        assert_eq!(job.result_uri.as_deref(), Some("https://example.com/video.mp4"));
    }

    #[tokio::test]
    async fn reported_error_stops_immediately() {
        let provider = ScriptedProvider::new(vec![
            Ok(PollStatus::Running),
            Ok(PollStatus::Failed {
                message: "prompt rejected".to_string(),
            }),
            done("https://example.com/never.mp4"),
        ]);
        let request = request();
        let mut job = GenerationJob::new(&request);

        let err = run_video_job(&provider, &mut job, &request, fast(0), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::JobReportedError);
        assert_eq!(err.message, "prompt rejected");
        assert_eq!(provider.polls(), 2);
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn poll_error_is_forwarded_verbatim() {
        let provider = ScriptedProvider::new(vec![
            Ok(PollStatus::Running),
            Err(DaemonError::polling_failed("HTTP 503")),
        ]);
        let request = request();
        let mut job = GenerationJob::new(&request);

        let err = run_video_job(&provider, &mut job, &request, fast(0), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PollingFailed);
        assert!(err.message.contains("HTTP 503"));
        assert_eq!(provider.polls(), 2);
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn missing_result_is_forwarded() {
        let provider = ScriptedProvider::new(vec![Err(DaemonError::missing_result(
            "models/veo/operations/test",
        ))]);
        let request = request();
        let mut job = GenerationJob::new(&request);

        let err = run_video_job(&provider, &mut job, &request, fast(0), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::MissingResult);
        assert_eq!(provider.polls(), 1);
    }

    #[tokio::test]
    async fn submit_failure_never_polls() {
        let provider = ScriptedProvider::failing_submit();
        let request = request();
        let mut job = GenerationJob::new(&request);
        let mut events = Vec::new();

        let err = run_video_job(&provider, &mut job, &request, fast(0), |e| {
            events.push(e.clone())
        })
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::SubmissionFailed);
        assert_eq!(provider.polls(), 0);
        assert!(events.is_empty());
        assert!(job.handle.is_none());
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn invalid_prompt_never_submits() {
        let provider = ScriptedProvider::new(vec![]);
        let mut request = request();
        request.prompt = String::new();
        let mut job = GenerationJob::new(&request);

        let err = run_video_job(&provider, &mut job, &request, fast(0), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InvalidPrompt);
        assert_eq!(provider.polls(), 0);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let provider = ScriptedProvider::new(vec![]);
        let request = request();
        let mut job = GenerationJob::new(&request);

        let err = run_video_job(&provider, &mut job, &request, fast(4), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::PollTimeout);
        assert_eq!(provider.polls(), 4);
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn progress_event_order() {
        let provider = ScriptedProvider::new(vec![Ok(PollStatus::Running), done("u")]);
        let request = request();
        let mut job = GenerationJob::new(&request);
        let mut events = Vec::new();

        run_video_job(&provider, &mut job, &request, fast(0), |e| events.push(e.clone()))
            .await
            .unwrap();

        let interval = Duration::from_millis(1);
        assert_eq!(
            events,
            vec![
                ProgressEvent::Submitted {
                    handle: "models/veo/operations/test".to_string()
                },
                ProgressEvent::Waiting {
                    poll_count: 0,
                    next_check: interval
                },
                ProgressEvent::Waiting {
                    poll_count: 1,
                    next_check: interval
                },
                ProgressEvent::Done { poll_count: 2 },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_fixed_interval_before_each_poll() {
        let provider = ScriptedProvider::new(vec![
            Ok(PollStatus::Running),
            Ok(PollStatus::Running),
            done("u"),
        ]);
        let request = request();
        let mut job = GenerationJob::new(&request);
        let start = tokio::time::Instant::now();

        run_video_job(&provider, &mut job, &request, PollOptions::default(), |_| {})
            .await
            .unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(15), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(16), "elapsed {:?}", elapsed);
    }

    #[test]
    fn options_from_config() {
        let config = DaemonConfig {
            poll_interval: Duration::from_secs(10),
            max_poll_attempts: 0,
            ..Default::default()
        };
        let options = PollOptions::from(&config);
        assert_eq!(options.interval, Duration::from_secs(10));
        assert!(!options.exhausted(u32::MAX));
        assert!(PollOptions::default().exhausted(120));
    }
}
