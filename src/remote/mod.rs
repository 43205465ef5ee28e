//! Seams in front of remote generation services.

/// Single-call image generator port.
pub mod generator;
/// Long-running video job submission and polling.
pub mod video;
