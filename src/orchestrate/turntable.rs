use std::time::Duration;

use crate::config::StudioConfig;
use crate::foundation::error::{EaselError, EaselResult, GenerationError};
use crate::foundation::math::{round_half_up, wrap_index};
use crate::history::log::{GenerationKind, HistoryEntry};
use crate::orchestrate::context::StudioContext;
use crate::prompts::angle_instruction;
use crate::raster::image::RasterImage;
use crate::remote::generator::{GenerationRequest, Generator};

/// Number of frames in a turntable.
pub const FRAME_COUNT: usize = 8;

/// Fixed turntable viewpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleId {
    /// 0 degrees.
    Front,
    /// 45 degrees.
    FrontRight,
    /// 90 degrees.
    Right,
    /// 135 degrees.
    BackRight,
    /// 180 degrees.
    Back,
    /// 225 degrees.
    BackLeft,
    /// 270 degrees.
    Left,
    /// 315 degrees.
    FrontLeft,
}

impl AngleId {
    /// Stable snake_case id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::FrontRight => "front_right",
            Self::Right => "right",
            Self::BackRight => "back_right",
            Self::Back => "back",
            Self::BackLeft => "back_left",
            Self::Left => "left",
            Self::FrontLeft => "front_left",
        }
    }
}

/// Static description of one viewpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AngleSpec {
    /// Viewpoint id.
    pub id: AngleId,
    /// Thumbnail label.
    pub label: &'static str,
    /// Camera description inserted into the instruction.
    pub direction_prompt: &'static str,
}

/// The eight viewpoints in playback order, 45 degrees apart.
pub const TURNTABLE_ANGLES: [AngleSpec; FRAME_COUNT] = [
    AngleSpec {
        id: AngleId::Front,
        label: "Front",
        direction_prompt: "front view, camera facing the subject head-on (0 degrees)",
    },
    AngleSpec {
        id: AngleId::FrontRight,
        label: "Front Right",
        direction_prompt: "three-quarter view from the front right, camera rotated 45 degrees around the subject",
    },
    AngleSpec {
        id: AngleId::Right,
        label: "Right",
        direction_prompt: "right side profile view, camera rotated 90 degrees around the subject",
    },
    AngleSpec {
        id: AngleId::BackRight,
        label: "Back Right",
        direction_prompt: "three-quarter view from the back right, camera rotated 135 degrees around the subject",
    },
    AngleSpec {
        id: AngleId::Back,
        label: "Back",
        direction_prompt: "back view, camera directly behind the subject (180 degrees)",
    },
    AngleSpec {
        id: AngleId::BackLeft,
        label: "Back Left",
        direction_prompt: "three-quarter view from the back left, camera rotated 225 degrees around the subject",
    },
    AngleSpec {
        id: AngleId::Left,
        label: "Left",
        direction_prompt: "left side profile view, camera rotated 270 degrees around the subject",
    },
    AngleSpec {
        id: AngleId::FrontLeft,
        label: "Front Left",
        direction_prompt: "three-quarter view from the front left, camera rotated 315 degrees around the subject",
    },
];

/// One slot of the turntable. `image` is `None` until its generation step completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TurntableFrame {
    /// Viewpoint.
    pub angle: AngleSpec,
    /// Generated (or, for the front, base) image.
    pub image: Option<RasterImage>,
}

/// Progress of the generation loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurntableState {
    /// Only the base frame is known.
    Idle,
    /// `current` of `total` frames are available.
    Running {
        /// Frames available so far, base included.
        current: usize,
        /// Always [`FRAME_COUNT`].
        total: usize,
    },
    /// All frames generated.
    Done,
    /// Generation stopped at a failing angle; earlier frames stay available.
    Failed(GenerationError),
}

/// What [`TurntableSession::apply_edit`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The front frame changed: all generated frames were dropped and the edit is the new base.
    Rebased,
    /// Only the frame at this index was replaced.
    FrameReplaced(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DragState {
    start_x: f64,
    start_index: usize,
}

/// Eight-frame turntable plus its playback cursor.
#[derive(Clone, Debug)]
pub struct TurntableSession {
    base: RasterImage,
    frames: Vec<TurntableFrame>,
    state: TurntableState,
    cursor: usize,
    playing: bool,
    drag: Option<DragState>,
    since_step: Duration,
    interval: Duration,
    sensitivity_px: f64,
}

impl TurntableSession {
    /// Promote `base` to turntable mode. Frame 0 is the base and is never regenerated.
    pub fn new(base: RasterImage, config: &StudioConfig) -> Self {
        Self::with_playback(base, config.playback_interval(), config.drag_sensitivity_px)
    }

    fn with_playback(base: RasterImage, interval: Duration, sensitivity_px: f64) -> Self {
        let frames = TURNTABLE_ANGLES
            .iter()
            .enumerate()
            .map(|(i, angle)| TurntableFrame {
                angle: *angle,
                image: (i == 0).then(|| base.clone()),
            })
            .collect();
        Self {
            base,
            frames,
            state: TurntableState::Idle,
            cursor: 0,
            playing: false,
            drag: None,
            since_step: Duration::ZERO,
            interval,
            sensitivity_px,
        }
    }

    /// Base image (frame 0).
    pub fn base(&self) -> &RasterImage {
        &self.base
    }

    /// All eight frames in fixed order.
    pub fn frames(&self) -> &[TurntableFrame] {
        &self.frames
    }

    /// Number of frames with an image.
    pub fn ready_count(&self) -> usize {
        self.frames.iter().filter(|f| f.image.is_some()).count()
    }

    /// Generation state.
    pub fn state(&self) -> &TurntableState {
        &self.state
    }

    /// Displayed frame index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Image under the cursor, if generated.
    pub fn current_image(&self) -> Option<&RasterImage> {
        self.frames[self.cursor].image.as_ref()
    }

    /// `true` while auto-play is on.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start auto-play.
    pub fn play(&mut self) {
        self.playing = true;
        self.since_step = Duration::ZERO;
    }

    /// Stop auto-play.
    pub fn pause(&mut self) {
        self.playing = false;
        self.since_step = Duration::ZERO;
    }

    /// Feed elapsed wall time to the auto-play timer. Returns how many steps the cursor moved.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        if !self.playing || self.interval.is_zero() {
            return 0;
        }
        self.since_step = self.since_step.saturating_add(elapsed);
        let interval = self.interval.as_nanos();
        let steps = self.since_step.as_nanos() / interval;
        self.since_step = Duration::from_nanos((self.since_step.as_nanos() % interval) as u64);
        self.cursor = (self.cursor + (steps % FRAME_COUNT as u128) as usize) % FRAME_COUNT;
        usize::try_from(steps).unwrap_or(usize::MAX)
    }

    /// Thumbnail click: stop auto-play and jump to `index`.
    pub fn select(&mut self, index: usize) -> EaselResult<()> {
        if index >= FRAME_COUNT {
            return Err(EaselError::validation(format!(
                "turntable index {index} out of range 0..{FRAME_COUNT}"
            )));
        }
        self.pause();
        self.cursor = index;
        Ok(())
    }

    /// Pointer down at horizontal position `x`: stop auto-play and remember the anchor.
    pub fn begin_drag(&mut self, x: f64) {
        self.pause();
        self.drag = Some(DragState {
            start_x: x,
            start_index: self.cursor,
        });
    }

    /// Pointer moved to `x` during a drag. Returns the new cursor.
    pub fn drag_to(&mut self, x: f64) -> usize {
        if let Some(d) = self.drag {
            self.cursor = drag_index(d.start_index, x - d.start_x, self.sensitivity_px);
        }
        self.cursor
    }

    /// Pointer released.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// `true` between [`TurntableSession::begin_drag`] and [`TurntableSession::end_drag`].
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Apply an externally edited version of the displayed frame.
    ///
    /// Editing the front frame invalidates every generated frame: the session restarts from the
    /// edited image in [`TurntableState::Idle`]. Editing any other frame replaces just that frame.
    pub fn apply_edit(&mut self, edited: RasterImage) -> EditOutcome {
        if self.cursor == 0 {
            tracing::debug!("front frame edited, rebasing turntable");
            *self = Self::with_playback(edited, self.interval, self.sensitivity_px);
            return EditOutcome::Rebased;
        }
        self.frames[self.cursor].image = Some(edited);
        EditOutcome::FrameReplaced(self.cursor)
    }

    fn reset_generated(&mut self) {
        for f in self.frames.iter_mut().skip(1) {
            f.image = None;
        }
        self.cursor = 0;
        self.drag = None;
        self.pause();
    }
}

/// Cursor after dragging `delta_x` pixels from `start_index`.
///
/// `((start + round(delta / sensitivity)) mod 8 + 8) mod 8`, rounding halves toward positive
/// infinity, so negative drags wrap to the end.
pub fn drag_index(start_index: usize, delta_x: f64, sensitivity_px: f64) -> usize {
    if !delta_x.is_finite() || !sensitivity_px.is_finite() || sensitivity_px <= 0.0 {
        return start_index % FRAME_COUNT;
    }
    let frames = FRAME_COUNT as i64;
    let steps = round_half_up(delta_x / sensitivity_px).rem_euclid(frames);
    wrap_index((start_index % FRAME_COUNT) as i64 + steps, FRAME_COUNT)
}

/// Generate the seven non-front angles of `session`, one remote call at a time.
///
/// `on_progress` sees the session after every completed angle and after the terminal
/// transition. On failure the loop stops; frames generated so far stay in the session. On
/// success the cursor returns to the front frame and auto-play starts unless
/// [`StudioConfig::reduce_motion`] is set.
#[tracing::instrument(skip_all, fields(w = session.base().width(), h = session.base().height()))]
pub fn generate_turntable(
    ctx: &mut StudioContext<'_>,
    generator: &mut dyn Generator,
    session: &mut TurntableSession,
    on_progress: &mut dyn FnMut(&TurntableSession),
) -> Result<(), GenerationError> {
    session.reset_generated();
    session.state = TurntableState::Running {
        current: 1,
        total: FRAME_COUNT,
    };
    on_progress(session);

    let base = session.base().clone();
    for i in 1..FRAME_COUNT {
        let angle = TURNTABLE_ANGLES[i];
        let instruction = angle_instruction(angle.direction_prompt);
        let result = generator.generate(&GenerationRequest {
            image: &base,
            mask: None,
            instruction: &instruction,
        });

        match result {
            Ok(img) => {
                ctx.history.add(
                    HistoryEntry::new(GenerationKind::Turntable, &img, instruction)
                        .with_details(angle.id.as_str())
                        .with_inputs(&[&base]),
                    ctx.clock,
                );
                session.frames[i].image = Some(img);
                session.state = TurntableState::Running {
                    current: i + 1,
                    total: FRAME_COUNT,
                };
                tracing::debug!(
                    angle = angle.id.as_str(),
                    current = i + 1,
                    "turntable angle ready"
                );
                on_progress(session);
            }
            Err(e) => {
                let err = GenerationError::from_upstream(&e);
                tracing::warn!(
                    angle = angle.id.as_str(),
                    error = %e,
                    kept = session.ready_count(),
                    "turntable angle failed"
                );
                session.state = TurntableState::Failed(err.clone());
                on_progress(session);
                return Err(err);
            }
        }
    }

    session.state = TurntableState::Done;
    session.cursor = 0;
    if !ctx.config.reduce_motion {
        session.play();
    }
    on_progress(session);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/orchestrate/turntable.rs"]
mod tests;
