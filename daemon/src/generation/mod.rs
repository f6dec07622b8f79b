//! Generation flows.
//!
//! Provides the submit-and-poll loop for video jobs and the speech
//! synthesis flow.

pub mod poller;
pub mod progress;
pub mod speech;

// Re-export commonly used items
pub use poller::{run_video_job, PollOptions};
pub use progress::ProgressEvent;
pub use speech::synthesize_clip;
