use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Time source injected into anything that timestamps or waits.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
    /// Block the calling thread for `d`.
    fn sleep(&self, d: Duration);
}

/// Wall-clock time and real sleeps.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Deterministic clock for tests: `sleep` advances time instantly and is recorded.
#[derive(Debug, Default)]
pub struct ManualClock {
    inner: Mutex<ManualClockState>,
}

#[derive(Debug, Default)]
struct ManualClockState {
    now_ms: u64,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    /// Start at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            inner: Mutex::new(ManualClockState {
                now_ms,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, d: Duration) {
        let mut st = self.lock();
        st.now_ms = st.now_ms.saturating_add(d.as_millis() as u64);
    }

    /// Every duration passed to [`Clock::sleep`], in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualClockState> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.lock().now_ms
    }

    fn sleep(&self, d: Duration) {
        let mut st = self.lock();
        st.now_ms = st.now_ms.saturating_add(d.as_millis() as u64);
        st.sleeps.push(d);
    }
}
