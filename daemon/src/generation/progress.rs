//! Progress events emitted while a video job runs.
//!
//! Events are display-only: the poll loop never reads them back, and
//! consumers (CLI, RPC notifications) only render the message.

use std::time::Duration;

/// A point in the lifetime of a video job worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The provider accepted the job.
    Submitted { handle: String },
    /// The job is still running; the loop is about to wait before the next check.
    Waiting { poll_count: u32, next_check: Duration },
    /// The job finished with a playable URI.
    Done { poll_count: u32 },
}

impl ProgressEvent {
    /// Human-readable text for the event.
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::Submitted { .. } => {
                "Video generation started. This can take a few minutes...".to_string()
            }
            ProgressEvent::Waiting {
                poll_count,
                next_check,
            } => {
                if *poll_count == 0 {
                    format!(
                        "Waiting for the video to render, checking again in {}s...",
                        next_check.as_secs()
                    )
                } else {
                    format!(
                        "Still rendering (check {}), checking again in {}s...",
                        poll_count,
                        next_check.as_secs()
                    )
                }
            }
            ProgressEvent::Done { .. } => "Video ready.".to_string(),
        }
    }

    /// Number of status checks made when the event was emitted.
    pub fn poll_count(&self) -> u32 {
        match self {
            ProgressEvent::Submitted { .. } => 0,
            ProgressEvent::Waiting { poll_count, .. } | ProgressEvent::Done { poll_count } => {
                *poll_count
            }
        }
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let submitted = ProgressEvent::Submitted {
            handle: "operations/1".to_string(),
        };
        assert!(submitted.message().contains("started"));
        assert_eq!(submitted.poll_count(), 0);

        let first_wait = ProgressEvent::Waiting {
            poll_count: 0,
            next_check: Duration::from_secs(5),
        };
        assert!(first_wait.message().contains("5s"));

        let later_wait = ProgressEvent::Waiting {
            poll_count: 3,
            next_check: Duration::from_secs(5),
        };
        assert!(later_wait.message().contains("check 3"));
        assert_eq!(later_wait.poll_count(), 3);

        assert_eq!(ProgressEvent::Done { poll_count: 4 }.to_string(), "Video ready.");
    }
}
