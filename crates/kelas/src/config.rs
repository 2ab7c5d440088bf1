//! Portal configuration.
//!
//! One JSON object, every field optional. Durations are milliseconds:
//!
//! ```json
//! {
//!   "session": { "window": 600000 },
//!   "telemetry": { "stats_period": 10000, "policy": "catch-up:2" },
//!   "storage_path": "kelas-store.json"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use kelas_protocol::duration_ms;
use kelas_session::{RouteTable, SessionConfig};
use kelas_tick::{TickPolicy, TickerConfig};
use kelas_widgets::TelemetryCard;
use serde::{Deserialize, Serialize};

use crate::PortalError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub session: SessionConfig,

    pub routes: RouteTable,

    pub telemetry: TelemetryConfig,

    /// How long a notice stays up unless dismissed. Default: 5 seconds.
    #[serde(with = "duration_ms")]
    pub notice_duration: Duration,

    /// Pause before the assistant answers. Default: 1 second.
    #[serde(with = "duration_ms")]
    pub chat_reply_delay: Duration,

    /// JSON file backing the key-value store. `None` keeps everything in
    /// memory.
    pub storage_path: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            routes: RouteTable::default(),
            telemetry: TelemetryConfig::default(),
            notice_duration: Duration::from_secs(5),
            chat_reply_delay: Duration::from_secs(1),
            storage_path: None,
        }
    }
}

/// Refresh periods of the status cards. A zero period turns that card
/// group off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Server time and uptime. Default: 1 second.
    #[serde(with = "duration_ms")]
    pub clock_period: Duration,

    /// Default: 5 seconds.
    #[serde(with = "duration_ms")]
    pub battery_period: Duration,

    /// Server and network timings. Default: 3 seconds.
    #[serde(with = "duration_ms")]
    pub stats_period: Duration,

    /// IP address. Default: 15 seconds.
    #[serde(with = "duration_ms")]
    pub network_period: Duration,

    /// What every telemetry ticker does when the loop falls behind.
    pub policy: TickPolicy,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            clock_period: Duration::from_secs(1),
            battery_period: Duration::from_secs(5),
            stats_period: Duration::from_secs(3),
            network_period: Duration::from_secs(15),
            policy: TickPolicy::default(),
        }
    }
}

impl TelemetryConfig {
    /// Every card group off.
    pub fn disabled() -> Self {
        Self {
            clock_period: Duration::ZERO,
            battery_period: Duration::ZERO,
            stats_period: Duration::ZERO,
            network_period: Duration::ZERO,
            policy: TickPolicy::default(),
        }
    }

    pub fn period(&self, card: TelemetryCard) -> Duration {
        match card {
            TelemetryCard::Clock => self.clock_period,
            TelemetryCard::Battery => self.battery_period,
            TelemetryCard::Stats => self.stats_period,
            TelemetryCard::Network => self.network_period,
        }
    }

    /// Ticker settings for one card group.
    pub fn ticker(&self, card: TelemetryCard) -> TickerConfig {
        TickerConfig {
            period: self.period(card),
            policy: self.policy,
            initial_jitter: Duration::ZERO,
        }
    }
}

impl PortalConfig {
    /// Shortest notice display time accepted.
    pub const MIN_NOTICE_DURATION: Duration = Duration::from_millis(500);

    /// Reads a config file. Fields missing from the file keep their
    /// defaults.
    ///
    /// # Errors
    /// - [`PortalError::Io`] if the file can't be read
    /// - [`PortalError::Config`] if it isn't a valid config object
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PortalError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| PortalError::Config(e.to_string()))?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config.validated())
    }

    /// Clamps values that would make the portal misbehave.
    pub fn validated(mut self) -> Self {
        self.session = self.session.validated();
        if self.notice_duration < Self::MIN_NOTICE_DURATION {
            tracing::warn!(
                notice_ms = self.notice_duration.as_millis(),
                "notice duration too short, clamping"
            );
            self.notice_duration = Self::MIN_NOTICE_DURATION;
        }
        self
    }
}
