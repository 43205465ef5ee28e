use crate::config::StudioConfig;
use crate::foundation::clock::Clock;
use crate::history::log::HistoryLog;

/// Explicit dependencies of an orchestrator run, owned by the calling view.
pub struct StudioContext<'a> {
    /// Application configuration.
    pub config: &'a StudioConfig,
    /// Time source for history timestamps.
    pub clock: &'a dyn Clock,
    /// Where successful results are recorded.
    pub history: &'a mut HistoryLog,
}

impl<'a> StudioContext<'a> {
    /// Bundle dependencies.
    pub fn new(config: &'a StudioConfig, clock: &'a dyn Clock, history: &'a mut HistoryLog) -> Self {
        Self {
            config,
            clock,
            history,
        }
    }
}
