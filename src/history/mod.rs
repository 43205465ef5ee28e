/// Bounded generation history.
pub mod log;
