//! Easel is the compositing and orchestration core of an AI image studio.
//!
//! It prepares pixels for a remote multimodal model and sequences multi-step generations:
//!
//! - Build expansion canvases and masks ([`build_expansion_canvas`], [`build_freeform_mask`])
//! - Outpaint in one direction or as a two-phase panorama ([`OutpaintOrchestrator`])
//! - Generate and play back an eight-angle turntable ([`generate_turntable`], [`TurntableSession`])
//! - Poll long-running video jobs against an injected clock ([`VideoPoller`])
//! - Keep a bounded, persisted generation history ([`HistoryLog`])
//!
//! The remote model sits behind the [`Generator`] trait; persistence sits behind [`KvStore`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Canvas compositing.
pub mod compose;
/// Studio configuration.
pub mod config;
/// Shared primitives, errors and clocks.
pub mod foundation;
/// Generation history.
pub mod history;
/// Multi-step generation flows.
pub mod orchestrate;
/// Instruction text builders.
pub mod prompts;
/// Raster images and masks.
pub mod raster;
/// Remote service ports.
pub mod remote;
/// Persistence port.
pub mod store;

pub use crate::compose::expand::{
    Direction, Edge, ExpansionCanvas, ExpansionSpec, ExpansionStep, build_expansion_canvas,
    expand_canvas,
};
pub use crate::compose::freeform::{Stroke, StrokeCanvas, Tool, build_freeform_mask};
pub use crate::config::StudioConfig;
pub use crate::foundation::clock::{Clock, ManualClock, SystemClock};
pub use crate::foundation::core::{Dims, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{
    EaselError, EaselResult, FailureKind, GenerationError, StoreError, UpstreamError,
    classify_upstream,
};
pub use crate::history::log::{
    GenerationKind, HistoryEntry, HistoryLog, HistoryRecord, SaveOutcome,
};
pub use crate::orchestrate::context::StudioContext;
pub use crate::orchestrate::outpaint::{OutpaintOrchestrator, OutpaintState};
pub use crate::orchestrate::turntable::{
    AngleId, AngleSpec, EditOutcome, FRAME_COUNT, TURNTABLE_ANGLES, TurntableFrame,
    TurntableSession, TurntableState, drag_index, generate_turntable,
};
pub use crate::raster::image::RasterImage;
pub use crate::raster::mask::Mask;
pub use crate::remote::generator::{GenerationRequest, Generator, Reply, ScriptedGenerator};
pub use crate::remote::video::{
    OperationHandle, OperationStatus, PollSettings, VideoArtifact, VideoBackend, VideoJobState,
    VideoPoller, VideoProgress, VideoRequest,
};
pub use crate::store::kv::{KvStore, MemoryStore};
