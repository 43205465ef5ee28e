//! Multi-step generation flows.
//!
//! Orchestrators hold their own state machine and take everything else through
//! [`context::StudioContext`].

/// Dependencies shared by every run.
pub mod context;
/// Single-direction and panoramic outpainting.
pub mod outpaint;
/// Eight-angle turntable generation and playback.
pub mod turntable;
