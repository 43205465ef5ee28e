//! Owned RGBA8 rasters and binary masks.

/// Immutable RGBA8 image.
pub mod image;
/// Binary black/white mask.
pub mod mask;
