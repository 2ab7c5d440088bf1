//! Dashboard widgets for Kelas.
//!
//! Everything on a portal page that isn't the session: the chat
//! assistant, the simulated device and server telemetry, the light/dark
//! theme switch, the password strength meter, and the static charts.
//!
//! Widgets are plain values. Nothing here owns a timer; the portal
//! runtime decides when to sample telemetry or deliver a chat reply.
//! Randomized widgets take an `Rng` so tests can pin the sequence.

mod assistant;
mod charts;
mod clock;
mod error;
mod password;
mod telemetry;
mod theme;

pub use assistant::{BATTERY_FALLBACK, ChatMessage, FALLBACK_REPLY, Sender, respond};
pub use charts::{Chart, ChartKind, Dataset, activity_chart, all_charts, time_chart, usage_chart};
pub use clock::{format_hhmm, format_long_date, format_server_time, format_uptime};
pub use error::WidgetError;
pub use password::{
    PasswordCheck, PasswordMatch, PasswordRule, StrengthLevel, check_match, check_strength,
};
pub use telemetry::{
    BatteryBand, BatteryReading, BatterySimulator, BatteryStatus, IP_ADDRESSES, SystemStats,
    Telemetry, TelemetryCard, TelemetryUpdate, detect_location, random_ip,
};
pub use theme::ThemeController;
