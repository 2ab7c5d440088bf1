//! Login credentials and the authentication hook.
//!
//! The portal has no credential store. "Logging in" means: check that both
//! form fields were filled, wait a moment, then make up a plausible student
//! profile. That make-believe lives behind the [`Authenticator`] trait so a
//! real check could replace it without touching the session guard.

use std::fmt;

use chrono::{DateTime, Utc};
use kelas_protocol::{DeviceInfo, ProfileStats, UserId, UserRecord};
use rand::Rng;

use crate::SessionError;

/// Message shown inline when a login field is left empty.
pub const EMPTY_FIELD_MESSAGE: &str = "Harap isi semua field";

/// Cities a synthesized profile may report.
pub const LOCATIONS: [&str; 5] = [
    "Jakarta, Indonesia",
    "Bandung, Indonesia",
    "Surabaya, Indonesia",
    "Medan, Indonesia",
    "Makassar, Indonesia",
];

/// What the login form submits.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember_me: false,
        }
    }

    /// Checks that neither field is empty. A field of spaces is filled.
    ///
    /// # Errors
    /// [`SessionError::Validation`] carrying [`EMPTY_FIELD_MESSAGE`].
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(SessionError::Validation(EMPTY_FIELD_MESSAGE.into()));
        }
        Ok(())
    }
}

// Keep the secret out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Turns validated credentials into a user record.
///
/// Called by the session guard once the simulated login latency has
/// elapsed. `now` comes from the guard's clock so implementations stay
/// deterministic under test.
pub trait Authenticator: Send + Sync + 'static {
    /// Produces the record of the user behind `credentials`.
    ///
    /// # Errors
    /// [`SessionError::AuthFailed`] if the credentials are refused.
    fn authenticate(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, SessionError>;
}

/// Accepts every username and invents a profile for it.
///
/// A placeholder, not a contract: it never fails, and every field except
/// the username-derived ones is random.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAuthenticator {
    device: DeviceInfo,
}

impl SimulatedAuthenticator {
    /// Profiles will report `device` as the login device.
    pub fn new(device: DeviceInfo) -> Self {
        Self { device }
    }
}

impl Authenticator for SimulatedAuthenticator {
    fn authenticate(
        &self,
        credentials: &Credentials,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, SessionError> {
        let username = credentials.username.as_str();
        let mut rng = rand::rng();

        let id = UserId(u64::try_from(now.timestamp_millis()).unwrap_or_default());

        Ok(UserRecord {
            id,
            username: username.to_string(),
            email: format!("{}@gmail.com", username.to_lowercase()),
            full_name: capitalize_name(username),
            role: "student".into(),
            class: "7F".into(),
            avatar: format!(
                "https://ui-avatars.com/api/?name={}&background=4361ee&color=fff",
                encode_uri_component(username)
            ),
            join_date: now,
            last_login: now,
            login_count: rng.random_range(1..=50),
            battery_level: rng.random_range(70..=99),
            stats: ProfileStats {
                messages: rng.random_range(0..1000),
                tasks_completed: rng.random_range(0..200),
                attendance: rng.random_range(80..100),
                performance: rng.random_range(70..100),
            },
            location: LOCATIONS[rng.random_range(0..LOCATIONS.len())].to_string(),
            device_info: self.device.clone(),
        })
    }
}

/// Capitalizes each word: first character upper case, the rest lower.
///
/// A word starts at an ASCII letter, digit or `_` and runs to the next
/// whitespace, so `"o'neil"` becomes `"O'neil"` and `"-budi"` becomes
/// `"-Budi"`. Other characters before a word are kept as they are:
/// `"éva"` becomes `"éVa"`.
pub fn capitalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_word = false;

    for c in name.chars() {
        if in_word {
            if c.is_whitespace() {
                in_word = false;
                out.push(c);
            } else {
                out.extend(c.to_lowercase());
            }
        } else if c.is_ascii_alphanumeric() || c == '_' {
            in_word = true;
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
///
/// Same set a browser's `encodeURIComponent` leaves alone.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(char::from(byte)),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
