use std::time::Duration;

use crate::foundation::clock::Clock;
use crate::foundation::error::{GenerationError, UpstreamError};
use crate::prompts::require_prompt;
use crate::raster::image::RasterImage;

/// Video generation input.
#[derive(Clone, Debug)]
pub struct VideoRequest {
    /// Natural-language description of the clip.
    pub prompt: String,
    /// Optional first frame.
    pub image: Option<RasterImage>,
}

/// Opaque long-running operation id returned by the upstream service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationHandle(pub String);

/// Finished video location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoArtifact {
    /// Download URI of the generated clip.
    pub uri: String,
}

/// Upstream answer to one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    /// Still running.
    Pending,
    /// Finished successfully.
    Done(VideoArtifact),
    /// Finished with an upstream error message.
    Failed(String),
}

/// Long-running generation endpoint.
pub trait VideoBackend {
    /// Start an operation.
    fn submit(&mut self, req: &VideoRequest) -> Result<OperationHandle, UpstreamError>;
    /// Query an operation once.
    fn poll(&mut self, handle: &OperationHandle) -> Result<OperationStatus, UpstreamError>;
}

/// Poll timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PollSettings {
    /// Wait before the first poll and the base wait between polls.
    pub interval: Duration,
    /// Multiplier applied to the wait after every poll. `1.0` keeps a fixed interval.
    pub backoff: f64,
    /// Upper bound for the wait.
    pub max_interval: Duration,
    /// Give up after this many polls.
    pub max_polls: u32,
    /// Polls after which the progress message switches to the long-wait wording.
    pub escalate_after: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            backoff: 1.0,
            max_interval: Duration::from_secs(60),
            max_polls: 60,
            escalate_after: 3,
        }
    }
}

/// Lifecycle of one video job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoJobState {
    /// Nothing submitted yet.
    Idle,
    /// Accepted by the upstream service.
    Submitted,
    /// Waiting on the operation; `polls` completed so far.
    Polling {
        /// Completed polls.
        polls: u32,
    },
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
}

/// Snapshot published to the progress observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoProgress {
    /// Current state.
    pub state: VideoJobState,
    /// User-facing status line.
    pub message: &'static str,
}

const MSG_SUBMITTED: &str = "Starting video generation...";
const MSG_POLLING: &str = "Generating your video. This usually takes a minute or two...";
const MSG_POLLING_LONG: &str =
    "Still working. Longer clips can take several minutes, please keep this page open.";
const MSG_DONE: &str = "Video ready.";
const MSG_FAILED: &str = "Video generation failed.";

/// Submit-then-poll state machine with an injected clock.
pub struct VideoPoller<'c> {
    settings: PollSettings,
    clock: &'c dyn Clock,
    state: VideoJobState,
}

impl<'c> VideoPoller<'c> {
    /// New poller in [`VideoJobState::Idle`].
    pub fn new(settings: PollSettings, clock: &'c dyn Clock) -> Self {
        Self {
            settings,
            clock,
            state: VideoJobState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &VideoJobState {
        &self.state
    }

    /// Submit `req` and poll until it finishes, fails, or runs out of polls.
    ///
    /// `on_progress` sees every state transition. Upstream errors are classified into
    /// [`GenerationError`]; nothing is retried.
    #[tracing::instrument(skip_all, fields(prompt_len = req.prompt.len()))]
    pub fn run(
        &mut self,
        backend: &mut dyn VideoBackend,
        req: &VideoRequest,
        on_progress: &mut dyn FnMut(&VideoProgress),
    ) -> Result<VideoArtifact, GenerationError> {
        let out = self.run_inner(backend, req, on_progress);
        if out.is_err() {
            self.transition(VideoJobState::Failed, on_progress);
        }
        out
    }

    fn run_inner(
        &mut self,
        backend: &mut dyn VideoBackend,
        req: &VideoRequest,
        on_progress: &mut dyn FnMut(&VideoProgress),
    ) -> Result<VideoArtifact, GenerationError> {
        require_prompt(&req.prompt)?;

        let handle = backend.submit(req).map_err(|e| {
            tracing::warn!(error = %e, "video submit failed");
            GenerationError::from_upstream(&e)
        })?;
        self.transition(VideoJobState::Submitted, on_progress);

        let mut wait = self.settings.interval;
        let mut polls = 0u32;
        while polls < self.settings.max_polls {
            self.clock.sleep(wait);
            let status = backend.poll(&handle).map_err(|e| {
                tracing::warn!(error = %e, polls, "video poll failed");
                GenerationError::from_upstream(&e)
            })?;
            polls += 1;

            match status {
                OperationStatus::Pending => {
                    self.transition(VideoJobState::Polling { polls }, on_progress);
                    wait = self.next_wait(wait);
                }
                OperationStatus::Done(artifact) => {
                    self.transition(VideoJobState::Done, on_progress);
                    tracing::debug!(polls, "video ready");
                    return Ok(artifact);
                }
                OperationStatus::Failed(msg) => {
                    tracing::warn!(polls, "video operation failed upstream");
                    return Err(GenerationError::from_upstream(&UpstreamError::new(msg)));
                }
            }
        }

        tracing::warn!(polls, "video operation did not finish in time");
        Err(GenerationError::generic(
            "Video generation is taking longer than expected. Please try again later.",
        ))
    }

    fn next_wait(&self, wait: Duration) -> Duration {
        let backoff = if self.settings.backoff.is_finite() && self.settings.backoff >= 1.0 {
            self.settings.backoff
        } else {
            1.0
        };
        Duration::try_from_secs_f64(wait.as_secs_f64() * backoff)
            .unwrap_or(self.settings.max_interval)
            .min(self.settings.max_interval)
    }

    fn transition(&mut self, state: VideoJobState, on_progress: &mut dyn FnMut(&VideoProgress)) {
        let message = progress_message(&state, self.settings.escalate_after);
        self.state = state.clone();
        on_progress(&VideoProgress { state, message });
    }
}

/// Status line for `state`; waits longer than `escalate_after` polls get the long-wait wording.
pub fn progress_message(state: &VideoJobState, escalate_after: u32) -> &'static str {
    match state {
        VideoJobState::Idle | VideoJobState::Submitted => MSG_SUBMITTED,
        VideoJobState::Polling { polls } if *polls > escalate_after => MSG_POLLING_LONG,
        VideoJobState::Polling { .. } => MSG_POLLING,
        VideoJobState::Done => MSG_DONE,
        VideoJobState::Failed => MSG_FAILED,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/remote/video.rs"]
mod tests;
