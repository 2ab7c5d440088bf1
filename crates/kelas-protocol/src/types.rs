//! Persisted record types.
//!
//! These are the structures that get written to the key-value store and
//! read back on the next page load. Field names and value shapes follow
//! what the browser portal wrote, so its stores decode as they are.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A unique identifier for a portal user.
///
/// Synthesized at login from the wall clock (milliseconds since the Unix
/// epoch), so two logins in the same millisecond would collide. Good enough
/// for a simulated portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UserRecord
// ---------------------------------------------------------------------------

/// Decorative per-user numbers shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub messages: u32,
    pub tasks_completed: u32,
    /// Percentage, 80–99.
    pub attendance: u32,
    /// Percentage, 70–99.
    pub performance: u32,
}

/// What the portal knows about the device the user logged in from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub browser: String,
    pub platform: String,
    pub language: String,
    /// `"WIDTHxHEIGHT"`.
    pub screen: String,
    /// Logical CPU count, if the host reports one. Written as
    /// `"Unknown"` when it doesn't.
    #[serde(default, with = "cpu_cores")]
    pub cores: Option<usize>,
}

/// `cores` is either a count or a placeholder string.
mod cpu_cores {
    use serde::{Deserialize, Deserializer, Serializer};

    pub const UNKNOWN: &str = "Unknown";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cores {
        Count(usize),
        Text(String),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<usize>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(count) => serializer.serialize_u64(u64::try_from(*count).unwrap_or(u64::MAX)),
            None => serializer.serialize_str(UNKNOWN),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<usize>, D::Error> {
        Ok(match Option::<Cores>::deserialize(deserializer)? {
            Some(Cores::Count(count)) => Some(count),
            Some(Cores::Text(text)) => text.trim().parse().ok(),
            None => None,
        })
    }
}

/// The logged-in user, persisted under [`keys::CURRENT_USER`](crate::keys::CURRENT_USER).
///
/// Created by the authenticator on a successful (simulated) login. Apart
/// from `username`, every field is derived or randomly generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// `lowercase(username)@gmail.com`.
    pub email: String,
    /// `username` with every word capitalized.
    pub full_name: String,
    pub role: String,
    pub class: String,
    pub avatar: String,
    pub join_date: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub login_count: u32,
    /// Starting point for the battery simulation, 70–99.
    pub battery_level: u8,
    pub stats: ProfileStats,
    pub location: String,
    pub device_info: DeviceInfo,
}

// ---------------------------------------------------------------------------
// UserStats
// ---------------------------------------------------------------------------

/// Aggregate counters for one user, kept across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsEntry {
    pub total_logins: u64,
    /// Milliseconds. Never incremented by the portal itself; kept so
    /// records written elsewhere survive a read-modify-write.
    pub total_time_spent: u64,
    pub last_activity: DateTime<Utc>,
    pub pages_visited: Vec<String>,
}

impl StatsEntry {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            total_logins: 0,
            total_time_spent: 0,
            last_activity: now,
            pages_visited: Vec::new(),
        }
    }
}

/// Map from user id to [`StatsEntry`], persisted under
/// [`keys::USER_STATS`](crate::keys::USER_STATS).
///
/// Keyed by the decimal id string, which is what a JSON object key has to
/// be anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UserStats(BTreeMap<String, StatsEntry>);

impl UserStats {
    /// Looks up the counters for `id`.
    pub fn get(&self, id: UserId) -> Option<&StatsEntry> {
        self.0.get(&id.0.to_string())
    }

    /// Records one login for `id` at `now`, creating the entry on first sight.
    pub fn record_login(&mut self, id: UserId, now: DateTime<Utc>) -> &StatsEntry {
        let entry = self
            .0
            .entry(id.0.to_string())
            .or_insert_with(|| StatsEntry::fresh(now));
        entry.total_logins += 1;
        entry.last_activity = now;
        entry
    }

    /// Number of users with counters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no user has counters yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SessionExpiry
// ---------------------------------------------------------------------------

/// The absolute instant a session stops being valid.
///
/// Stored under [`keys::SESSION_EXPIRY`](crate::keys::SESSION_EXPIRY) as a
/// decimal count of milliseconds since the Unix epoch, not as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionExpiry(pub DateTime<Utc>);

impl SessionExpiry {
    /// The storage form: milliseconds since the epoch, as text.
    pub fn to_storage_string(&self) -> String {
        self.0.timestamp_millis().to_string()
    }

    /// Parses the storage form.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Invalid`] if the text is not an integer or
    /// is out of chrono's representable range.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let millis: i64 = text.trim().parse().map_err(|_| {
            ProtocolError::Invalid(format!("expiry is not a millisecond timestamp: {text:?}"))
        })?;
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(Self)
            .ok_or_else(|| ProtocolError::Invalid(format!("expiry out of range: {millis}")))
    }

    /// Returns `true` once `now` has reached the expiry instant.
    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.0
    }
}
