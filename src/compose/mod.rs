//! Canvas compositing: expansion canvases and freeform masks.

/// Expansion planning and canvas/mask construction.
pub mod expand;
/// Brush and eraser strokes with undo/redo.
pub mod freeform;
