//! Fixed-period interval timer with overrun handling.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

use crate::TickError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late (the task was busy past a deadline).
///
/// In config files the policy is written as a string: `"skip"`, `"drop"`,
/// `"catch-up"` (limit 3) or `"catch-up:N"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one a full period
    /// from now.
    #[default]
    Skip,
    /// Fire the missed ticks back to back, up to `max_catchup` of them.
    /// Further behind than that, fall back to [`Skip`](Self::Skip).
    CatchUp { max_catchup: u32 },
    /// Keep the original cadence. The late tick still counts, and the next
    /// one fires at its originally scheduled time.
    Drop,
}

impl TickPolicy {
    const DEFAULT_CATCHUP: u32 = 3;
}

impl fmt::Display for TickPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Drop => write!(f, "drop"),
            Self::CatchUp { max_catchup } => write!(f, "catch-up:{max_catchup}"),
        }
    }
}

impl FromStr for TickPolicy {
    type Err = TickError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "skip" => Ok(Self::Skip),
            "drop" => Ok(Self::Drop),
            "catch-up" => Ok(Self::CatchUp {
                max_catchup: Self::DEFAULT_CATCHUP,
            }),
            _ => match s.strip_prefix("catch-up:") {
                Some(n) => n
                    .parse()
                    .map(|max_catchup| Self::CatchUp { max_catchup })
                    .map_err(|_| TickError::InvalidCatchUp(n.to_string())),
                None => Err(TickError::UnknownPolicy(s)),
            },
        }
    }
}

impl TryFrom<String> for TickPolicy {
    type Error = TickError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TickPolicy> for String {
    fn from(policy: TickPolicy) -> Self {
        policy.to_string()
    }
}

/// Configuration for a [`Ticker`].
#[derive(Debug, Clone)]
pub struct TickerConfig {
    /// Time between ticks. Zero disables the ticker.
    pub period: Duration,
    /// Overrun handling.
    pub policy: TickPolicy,
    /// Random extra delay (0..jitter) before the *first* tick, so tickers
    /// started together don't stay in lockstep.
    pub initial_jitter: Duration,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            period: Duration::ZERO,
            policy: TickPolicy::default(),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl TickerConfig {
    /// Shortest non-zero period accepted.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// A config ticking every `period`, no jitter.
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    /// Clamp out-of-range values.
    ///
    /// Called by [`Ticker::new`]. A non-zero period below
    /// [`Self::MIN_PERIOD`] is raised to it; jitter is capped at one period.
    pub fn validated(mut self) -> Self {
        if !self.period.is_zero() && self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis(),
                min_ms = Self::MIN_PERIOD.as_millis(),
                "ticker period too short, clamping"
            );
            self.period = Self::MIN_PERIOD;
        }
        if self.initial_jitter > self.period {
            self.initial_jitter = self.period;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`Ticker::wait_for_tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickInfo {
    /// Monotonically increasing tick number, starting at 1.
    pub tick: u64,
    /// `true` if this tick fired more than a tenth of a period late.
    pub overrun: bool,
    /// Ticks that were dropped rather than fired because of the overrun.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// A fixed-period interval timer for one `select!` loop.
pub struct Ticker {
    config: TickerConfig,
    tick_count: u64,
    /// When the next tick is due. `None` when disabled.
    next_tick: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl Ticker {
    /// Creates a ticker. The first tick is one period (plus jitter) away.
    pub fn new(config: TickerConfig) -> Self {
        let config = config.validated();

        let next_tick = (!config.period.is_zero()).then(|| {
            let jitter = if config.initial_jitter.is_zero() {
                Duration::ZERO
            } else {
                let max = u64::try_from(config.initial_jitter.as_millis()).unwrap_or(u64::MAX);
                Duration::from_millis(rand::rng().random_range(0..=max))
            };
            Instant::now() + config.period + jitter
        });

        if next_tick.is_none() {
            debug!("ticker created disabled");
        } else {
            debug!(
                period_ms = config.period.as_millis(),
                policy = %config.policy,
                "ticker created"
            );
        }

        Self {
            config,
            tick_count: 0,
            next_tick,
            paused: false,
            metrics: TickMetrics::default(),
        }
    }

    /// Shorthand for [`TickerConfig::every`] with defaults.
    pub fn every(period: Duration) -> Self {
        Self::new(TickerConfig::every(period))
    }

    /// Waits until the next tick is due.
    ///
    /// Pends forever when disabled or paused. Cancel-safe: dropping the
    /// future before it resolves loses nothing.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = match self.next_tick {
            Some(next) if !self.paused => next,
            _ => return std::future::pending().await,
        };
        let period = self.config.period;

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let behind = periods_in(late_by, period);
        let mut ticks_skipped = 0;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Skip => {
                ticks_skipped = behind;
                if behind > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = behind,
                        "ticker overrun, skipping ahead"
                    );
                }
                now + period
            }
            TickPolicy::CatchUp { max_catchup } => {
                let max_catchup = u64::from(max_catchup);
                if behind <= max_catchup {
                    next + period
                } else {
                    ticks_skipped = behind - max_catchup;
                    warn!(
                        tick = self.tick_count,
                        behind,
                        skipped = ticks_skipped,
                        "ticker overrun beyond catch-up limit"
                    );
                    now + period
                }
            }
            TickPolicy::Drop => {
                if overrun {
                    debug!(tick = self.tick_count, late_ms = late_by.as_millis(), "late tick");
                }
                next + period
            }
        });

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
            ticks_skipped,
        }
    }

    /// Stops ticks until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "ticker paused");
        }
    }

    /// Restarts ticking one full period from now. Time spent paused is
    /// not caught up.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.reset();
            debug!(tick = self.tick_count, "ticker resumed");
        }
    }

    /// Moves the next tick to one full period from now.
    pub fn reset(&mut self) {
        if !self.is_disabled() {
            self.next_tick = Some(Instant::now() + self.config.period);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` when the period is zero and the ticker never fires.
    pub fn is_disabled(&self) -> bool {
        self.next_tick.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn period(&self) -> Duration {
        self.config.period
    }
}

/// Whole periods that fit in `span`.
fn periods_in(span: Duration, period: Duration) -> u64 {
    if period.is_zero() {
        return 0;
    }
    u64::try_from(span.as_nanos() / period.as_nanos()).unwrap_or(u64::MAX)
}
