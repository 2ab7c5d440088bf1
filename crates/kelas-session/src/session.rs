//! Session types: configuration, state, and the in-memory session record.
//!
//! A "session" is the period during which a visitor is treated as logged
//! in. It tracks:
//! - WHO is logged in (the [`UserRecord`])
//! - UNTIL WHEN (the [`SessionExpiry`], pushed forward on activity)

use std::fmt;
use std::time::Duration;

use kelas_protocol::{SessionExpiry, UserRecord, duration_ms};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing for the session lifecycle.
///
/// All durations are written as milliseconds in JSON config files. Missing
/// fields fall back to [`Default`], so a config file only needs the values
/// it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How far each activity pushes the expiry. Default: 30 minutes.
    #[serde(with = "duration_ms")]
    pub window: Duration,

    /// How often the runtime calls `check_expiry`. Default: 60 seconds.
    #[serde(with = "duration_ms")]
    pub check_interval: Duration,

    /// Simulated round-trip before a login completes. Default: 2 seconds.
    #[serde(with = "duration_ms")]
    pub login_latency: Duration,

    /// Delay between a completed login and the move to the landing page.
    /// Default: 1.5 seconds.
    #[serde(with = "duration_ms")]
    pub login_redirect_delay: Duration,

    /// Simulated round-trip before a logout completes. Default: 1 second.
    #[serde(with = "duration_ms")]
    pub logout_latency: Duration,

    /// Delay between a completed logout and the move to the entry page.
    /// Default: 1 second.
    #[serde(with = "duration_ms")]
    pub logout_redirect_delay: Duration,

    /// How long the "session expired" notice shows before the redirect.
    /// Default: 2 seconds.
    #[serde(with = "duration_ms")]
    pub expired_redirect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30 * 60),
            check_interval: Duration::from_secs(60),
            login_latency: Duration::from_secs(2),
            login_redirect_delay: Duration::from_millis(1500),
            logout_latency: Duration::from_secs(1),
            logout_redirect_delay: Duration::from_secs(1),
            expired_redirect_delay: Duration::from_secs(2),
        }
    }
}

impl SessionConfig {
    /// Shortest window and check interval accepted.
    pub const MIN_PERIOD: Duration = Duration::from_secs(1);

    /// Clamps values that would make the guard misbehave.
    ///
    /// A zero window would expire every session the moment it's created; a
    /// zero check interval would spin the runtime. Both are raised to
    /// [`Self::MIN_PERIOD`].
    pub fn validated(mut self) -> Self {
        if self.window < Self::MIN_PERIOD {
            tracing::warn!(
                window_ms = self.window.as_millis(),
                "session window too short, clamping"
            );
            self.window = Self::MIN_PERIOD;
        }
        if self.check_interval < Self::MIN_PERIOD {
            tracing::warn!(
                interval_ms = self.check_interval.as_millis(),
                "expiry check interval too short, clamping"
            );
            self.check_interval = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Whether the visitor is logged in.
///
/// ```text
///   Anonymous ──(complete_login)──→ Active
///       ↑                              │
///       └──────(logout / expire)───────┘
/// ```
///
/// There are no other states. A page load starts from whatever
/// `restore()` finds in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Active,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Active => write!(f, "Active"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The in-memory half of a session. The durable half is the
/// `currentUser` / `sessionExpiry` pair in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: UserRecord,
    pub expires_at: SessionExpiry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.window, Duration::from_secs(1800));
        assert_eq!(config.check_interval, Duration::from_secs(60));
        assert_eq!(config.login_latency, Duration::from_secs(2));
    }

    #[test]
    fn test_session_config_partial_json_keeps_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"window": 60000}"#).unwrap();
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.check_interval, SessionConfig::default().check_interval);
    }

    #[test]
    fn test_session_config_validated_clamps_zero() {
        let config = SessionConfig {
            window: Duration::ZERO,
            check_interval: Duration::from_millis(10),
            ..SessionConfig::default()
        }
        .validated();

        assert_eq!(config.window, SessionConfig::MIN_PERIOD);
        assert_eq!(config.check_interval, SessionConfig::MIN_PERIOD);
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Active.to_string(), "Active");
        assert_eq!(SessionState::Anonymous.to_string(), "Anonymous");
    }
}
