//! A wall clock driven by Tokio's timer.

use chrono::{DateTime, TimeDelta, Utc};
use kelas_session::Clock;
use tokio::time::Instant;

/// Wall-clock time that moves with [`tokio::time`].
///
/// Reads as `base + (tokio now − start)`. Under a paused test runtime the
/// session expiry and the timers therefore advance together, so a
/// 30-minute window can be crossed with `tokio::time::advance`.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base: DateTime<Utc>,
    start: Instant,
}

impl TokioClock {
    /// Starts at the system time.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Starts at `base`. Must be called inside a Tokio runtime.
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.start.elapsed();
        TimeDelta::from_std(elapsed)
            .ok()
            .and_then(|delta| self.base.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
