/// Injectable time source.
pub mod clock;
/// Pixel dimensions, colours and geometry re-exports.
pub mod core;
/// Error taxonomy and upstream failure classification.
pub mod error;
pub(crate) mod math;
