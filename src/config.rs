use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::compose::expand::{DEFAULT_PANORAMIC_RATIO, DEFAULT_SINGLE_RATIO};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{EaselError, EaselResult};
use crate::history::log::DEFAULT_HISTORY_CAPACITY;
use crate::remote::video::PollSettings;
use crate::store::kv::{KvStore, user_key};

const CONFIG_KEY: &str = "config";

/// Application configuration passed explicitly to every orchestrator.
///
/// Missing JSON fields take their defaults, so older saved configs keep loading.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Fraction of the source added by a single-direction outpaint.
    pub single_ratio: f64,
    /// Fraction of the source width added by each panoramic phase.
    pub panoramic_ratio: f64,
    /// Colour of freshly added outpaint pixels.
    pub expansion_fill: Rgba8,
    /// Pixels of horizontal drag per turntable step.
    pub drag_sensitivity_px: f64,
    /// Turntable auto-play step interval in milliseconds.
    pub playback_interval_ms: u64,
    /// Generation history cap.
    pub history_capacity: usize,
    /// Video poll interval in milliseconds.
    pub video_poll_interval_ms: u64,
    /// Multiplier applied to the poll interval after each poll.
    pub video_poll_backoff: f64,
    /// Upper bound on the poll interval in milliseconds.
    pub video_poll_max_interval_ms: u64,
    /// Polls before a video job is abandoned.
    pub video_max_polls: u32,
    /// Polls before the progress message switches to the long-wait wording.
    pub video_escalate_after: u32,
    /// Disable auto-play and animated transitions. A finished turntable stays paused on the front
    /// frame when set.
    pub reduce_motion: bool,
    /// Dense layout. Carried for the view; nothing in this crate reads it.
    pub compact_mode: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            single_ratio: DEFAULT_SINGLE_RATIO,
            panoramic_ratio: DEFAULT_PANORAMIC_RATIO,
            expansion_fill: Rgba8::TRANSPARENT,
            drag_sensitivity_px: 50.0,
            playback_interval_ms: 250,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            video_poll_interval_ms: 10_000,
            video_poll_backoff: 1.0,
            video_poll_max_interval_ms: 60_000,
            video_max_polls: 60,
            video_escalate_after: 3,
            reduce_motion: false,
            compact_mode: false,
        }
    }
}

impl StudioConfig {
    /// Parse from a JSON reader and validate.
    pub fn from_reader<R: std::io::Read>(r: R) -> EaselResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| EaselError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse from a JSON file on disk and validate.
    pub fn from_path(path: impl AsRef<Path>) -> EaselResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            EaselError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Load the config saved for `user`, falling back to defaults when none is stored.
    pub fn load_from_store(store: &dyn KvStore, user: &str) -> EaselResult<Self> {
        match store.get(&user_key(user, CONFIG_KEY))? {
            Some(raw) => Self::from_reader(raw.as_bytes()),
            None => Ok(Self::default()),
        }
    }

    /// Save for `user`.
    pub fn save_to_store(&self, store: &mut dyn KvStore, user: &str) -> EaselResult<()> {
        self.validate()?;
        let json = serde_json::to_string(self)
            .map_err(|e| EaselError::serde(format!("serialize config: {e}")))?;
        store.set(&user_key(user, CONFIG_KEY), &json)?;
        Ok(())
    }

    /// Reject values no orchestrator can run with.
    pub fn validate(&self) -> EaselResult<()> {
        for (name, v) in [
            ("single_ratio", self.single_ratio),
            ("panoramic_ratio", self.panoramic_ratio),
            ("drag_sensitivity_px", self.drag_sensitivity_px),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(EaselError::validation(format!(
                    "config {name} must be finite and > 0, got {v}"
                )));
            }
        }
        if !self.video_poll_backoff.is_finite() || self.video_poll_backoff < 1.0 {
            return Err(EaselError::validation(
                "config video_poll_backoff must be finite and >= 1",
            ));
        }
        if self.playback_interval_ms == 0 || self.video_poll_interval_ms == 0 {
            return Err(EaselError::validation("config intervals must be > 0"));
        }
        if self.video_poll_max_interval_ms < self.video_poll_interval_ms {
            return Err(EaselError::validation(
                "config video_poll_max_interval_ms must be >= video_poll_interval_ms",
            ));
        }
        if self.history_capacity == 0 || self.video_max_polls == 0 {
            return Err(EaselError::validation(
                "config history_capacity and video_max_polls must be > 0",
            ));
        }
        Ok(())
    }

    /// Turntable auto-play interval.
    pub fn playback_interval(&self) -> Duration {
        Duration::from_millis(self.playback_interval_ms)
    }

    /// Video polling settings.
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.video_poll_interval_ms),
            backoff: self.video_poll_backoff,
            max_interval: Duration::from_millis(self.video_poll_max_interval_ms),
            max_polls: self.video_max_polls,
            escalate_after: self.video_escalate_after,
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
