//! Time formatting for the clock and uptime widgets.
//!
//! The portal's locale is Indonesian: times use `.` between fields and
//! dates spell out day and month names.

use std::time::Duration;

use chrono::{Datelike, Timelike, Weekday};

const DAYS: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];

const MONTHS: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// `HH:MM:SS`. Hours keep counting past 24 and widen past 99.
pub fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// `HH:MM`, as stamped on chat messages.
pub fn format_hhmm<T: Timelike>(at: &T) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

/// `HH.MM.SS`, the server clock.
pub fn format_server_time<T: Timelike>(at: &T) -> String {
    format!("{:02}.{:02}.{:02}", at.hour(), at.minute(), at.second())
}

/// `Jumat, 16 Oktober 2026`.
pub fn format_long_date<T: Datelike>(at: &T) -> String {
    let day = DAYS[day_index(at.weekday())];
    let month = MONTHS[at.month0() as usize];
    format!("{day}, {} {month} {}", at.day(), at.year())
}

fn day_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}
