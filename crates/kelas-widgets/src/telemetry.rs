//! Simulated device and server telemetry.
//!
//! Every number on the dashboard's status cards is made up: a battery
//! that wanders up and down, server timings drawn fresh on each refresh,
//! a LAN address picked from a short list. None of it is persisted.

use std::time::Duration;

use chrono::{Datelike, Timelike};
use rand::Rng;
use serde::Serialize;

use crate::{format_long_date, format_server_time, format_uptime};

/// Addresses the "IP address" card cycles through.
pub const IP_ADDRESSES: [&str; 3] = ["192.168.1.105", "192.168.1.110", "192.168.1.115"];

const IP_LOCATIONS: [&str; 3] = ["Jakarta, Indonesia", "Bandung, Indonesia", "Surabaya, Indonesia"];

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryStatus {
    Charging,
    Full,
}

impl BatteryStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Charging => "Mengisi Daya",
            Self::Full => "Penuh",
        }
    }
}

/// Color band of the battery bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryBand {
    Low,
    Medium,
    High,
}

impl BatteryBand {
    /// CSS gradient for the bar fill.
    pub fn gradient(self) -> &'static str {
        match self {
            Self::Low => "linear-gradient(90deg, #ef4444, #f87171)",
            Self::Medium => "linear-gradient(90deg, #f59e0b, #fbbf24)",
            Self::High => "linear-gradient(90deg, #10b981, #34d399)",
        }
    }
}

/// What the battery widgets show for one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryReading {
    /// Unrounded level, 10.0..=100.0.
    pub level: f64,
    pub status: BatteryStatus,
    pub band: BatteryBand,
    /// `"{h}j {m}m"`.
    pub time_left: String,
}

impl BatteryReading {
    pub fn from_level(level: f64) -> Self {
        let status = if level < 95.0 {
            BatteryStatus::Charging
        } else {
            BatteryStatus::Full
        };
        let band = if level < 20.0 {
            BatteryBand::Low
        } else if level < 50.0 {
            BatteryBand::Medium
        } else {
            BatteryBand::High
        };

        // Rough conversion: 4.16 % per hour, 0.069 % per minute.
        let hours = (level / 4.16).floor();
        let minutes = ((level % 4.16) / 0.069).floor();

        Self {
            level,
            status,
            band,
            time_left: format!("{hours}j {minutes}m"),
        }
    }

    /// Level as the page prints it, e.g. `"82%"`.
    pub fn percent_text(&self) -> String {
        format!("{}%", self.level.round())
    }
}

/// A battery level that random-walks between samples.
#[derive(Debug, Clone, PartialEq)]
pub struct BatterySimulator {
    level: f64,
}

impl Default for BatterySimulator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

impl BatterySimulator {
    pub const DEFAULT_LEVEL: u8 = 75;
    pub const MIN_LEVEL: f64 = 10.0;
    pub const MAX_LEVEL: f64 = 100.0;
    /// Largest change per step, either way.
    pub const MAX_STEP: f64 = 2.0;

    /// Starts at `level` percent, clamped into range.
    pub fn new(level: u8) -> Self {
        Self {
            level: f64::from(level).clamp(Self::MIN_LEVEL, Self::MAX_LEVEL),
        }
    }

    /// Starts at the logged-in user's battery level, or the default.
    pub fn seeded(level: Option<u8>) -> Self {
        level.map_or_else(Self::default, Self::new)
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn reading(&self) -> BatteryReading {
        BatteryReading::from_level(self.level)
    }

    /// Moves the level by up to ±2 and returns the new reading.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> BatteryReading {
        let change = rng.random_range(-Self::MAX_STEP..Self::MAX_STEP);
        self.level = (self.level + change).clamp(Self::MIN_LEVEL, Self::MAX_LEVEL);
        self.reading()
    }
}

// ---------------------------------------------------------------------------
// Server and network
// ---------------------------------------------------------------------------

/// One refresh of the server and network cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub online_users: u32,
    pub response_ms: u32,
    pub server_response_ms: u32,
    pub db_queries_per_min: u32,
    pub ping_ms: u32,
    pub speed_mbps: u32,
    pub latency_ms: u32,
}

impl SystemStats {
    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self {
            online_users: rng.random_range(20..30),
            response_ms: rng.random_range(10..60),
            server_response_ms: rng.random_range(5..45),
            db_queries_per_min: rng.random_range(100..200),
            ping_ms: rng.random_range(10..40),
            speed_mbps: rng.random_range(50..100),
            latency_ms: rng.random_range(15..35),
        }
    }
}

pub fn random_ip<R: Rng>(rng: &mut R) -> &'static str {
    IP_ADDRESSES[rng.random_range(0..IP_ADDRESSES.len())]
}

/// Pretends to geolocate the visitor by IP.
pub fn detect_location<R: Rng>(rng: &mut R) -> &'static str {
    IP_LOCATIONS[rng.random_range(0..IP_LOCATIONS.len())]
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// A group of status cards that refresh together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryCard {
    /// Server time, date and uptime.
    Clock,
    Battery,
    /// Server and network timings.
    Stats,
    /// IP address and location.
    Network,
}

impl TelemetryCard {
    pub const ALL: [Self; 4] = [Self::Clock, Self::Battery, Self::Stats, Self::Network];
}

/// One refresh of one card group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "card", rename_all = "lowercase")]
pub enum TelemetryUpdate {
    Clock {
        /// `HH.MM.SS`.
        server_time: String,
        date: String,
        /// Time since the page loaded, `HH:MM:SS`.
        uptime: String,
    },
    Battery(BatteryReading),
    Stats(SystemStats),
    Network {
        ip: &'static str,
        location: &'static str,
    },
}

impl TelemetryUpdate {
    pub fn card(&self) -> TelemetryCard {
        match self {
            Self::Clock { .. } => TelemetryCard::Clock,
            Self::Battery(_) => TelemetryCard::Battery,
            Self::Stats(_) => TelemetryCard::Stats,
            Self::Network { .. } => TelemetryCard::Network,
        }
    }
}

/// Per-page telemetry state. The battery level and the detected location
/// carry over between refreshes; everything else is drawn fresh.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    battery: BatterySimulator,
    location: Option<&'static str>,
}

impl Telemetry {
    pub fn new(battery: BatterySimulator) -> Self {
        Self {
            battery,
            location: None,
        }
    }

    pub fn battery(&self) -> &BatterySimulator {
        &self.battery
    }

    pub fn clock<T: Datelike + Timelike>(&self, now: &T, uptime: Duration) -> TelemetryUpdate {
        TelemetryUpdate::Clock {
            server_time: format_server_time(now),
            date: format_long_date(now),
            uptime: format_uptime(uptime),
        }
    }

    /// Steps the battery walk.
    pub fn battery_step<R: Rng>(&mut self, rng: &mut R) -> TelemetryUpdate {
        TelemetryUpdate::Battery(self.battery.step(rng))
    }

    pub fn stats<R: Rng>(&self, rng: &mut R) -> TelemetryUpdate {
        TelemetryUpdate::Stats(SystemStats::sample(rng))
    }

    /// Picks a new address. The location is detected once and kept.
    pub fn network<R: Rng>(&mut self, rng: &mut R) -> TelemetryUpdate {
        let location = *self.location.get_or_insert_with(|| detect_location(rng));
        TelemetryUpdate::Network {
            ip: random_ip(rng),
            location,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_reading_status_threshold() {
        assert_eq!(BatteryReading::from_level(94.9).status, BatteryStatus::Charging);
        assert_eq!(BatteryReading::from_level(95.0).status, BatteryStatus::Full);
        assert_eq!(BatteryStatus::Charging.label(), "Mengisi Daya");
    }

    #[test]
    fn test_reading_bands() {
        assert_eq!(BatteryReading::from_level(19.9).band, BatteryBand::Low);
        assert_eq!(BatteryReading::from_level(20.0).band, BatteryBand::Medium);
        assert_eq!(BatteryReading::from_level(49.9).band, BatteryBand::Medium);
        assert_eq!(BatteryReading::from_level(50.0).band, BatteryBand::High);
    }

    #[test]
    fn test_reading_time_left() {
        // 75 / 4.16 = 18.03..; 75 % 4.16 = 0.12; 0.12 / 0.069 = 1.7..
        assert_eq!(BatteryReading::from_level(75.0).time_left, "18j 1m");
        assert_eq!(BatteryReading::from_level(100.0).time_left, "24j 2m");
        assert_eq!(BatteryReading::from_level(10.0).time_left, "2j 24m");
    }

    #[test]
    fn test_percent_text_rounds() {
        assert_eq!(BatteryReading::from_level(81.6).percent_text(), "82%");
        assert_eq!(BatteryReading::from_level(75.0).percent_text(), "75%");
    }

    #[test]
    fn test_simulator_seeded_default() {
        assert_eq!(BatterySimulator::seeded(None).level(), 75.0);
        assert_eq!(BatterySimulator::seeded(Some(88)).level(), 88.0);
        assert_eq!(BatterySimulator::new(3).level(), 10.0);
    }

    #[test]
    fn test_simulator_walk_stays_in_range_and_step_bounded() {
        let mut rng = rng();
        let mut battery = BatterySimulator::new(12);

        for _ in 0..2_000 {
            let before = battery.level();
            let reading = battery.step(&mut rng);
            assert!((10.0..=100.0).contains(&reading.level));
            assert!((reading.level - before).abs() <= 2.0);
        }
    }

    #[test]
    fn test_system_stats_ranges() {
        let mut rng = rng();
        for _ in 0..500 {
            let s = SystemStats::sample(&mut rng);
            assert!((20..30).contains(&s.online_users));
            assert!((10..60).contains(&s.response_ms));
            assert!((5..45).contains(&s.server_response_ms));
            assert!((100..200).contains(&s.db_queries_per_min));
            assert!((10..40).contains(&s.ping_ms));
            assert!((50..100).contains(&s.speed_mbps));
            assert!((15..35).contains(&s.latency_ms));
        }
    }

    #[test]
    fn test_random_ip_from_list() {
        let mut rng = rng();
        for _ in 0..50 {
            assert!(IP_ADDRESSES.contains(&random_ip(&mut rng)));
        }
    }

    #[test]
    fn test_telemetry_network_keeps_location() {
        let mut rng = rng();
        let mut telemetry = Telemetry::default();

        let locations: Vec<_> = (0..20)
            .map(|_| match telemetry.network(&mut rng) {
                TelemetryUpdate::Network { ip, location } => {
                    assert!(IP_ADDRESSES.contains(&ip));
                    location
                }
                other => panic!("unexpected update: {other:?}"),
            })
            .collect();

        assert!(locations.iter().all(|l| *l == locations[0]));
    }

    #[test]
    fn test_telemetry_clock_formats_time_and_uptime() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();

        let update = Telemetry::default().clock(&now, Duration::from_secs(3661));

        assert_eq!(
            update,
            TelemetryUpdate::Clock {
                server_time: "08.05.09".into(),
                date: "Jumat, 16 Oktober 2026".into(),
                uptime: "01:01:01".into(),
            }
        );
        assert_eq!(update.card(), TelemetryCard::Clock);
    }

    #[test]
    fn test_telemetry_battery_step_walks_own_level() {
        let mut rng = rng();
        let mut telemetry = Telemetry::new(BatterySimulator::new(88));

        let TelemetryUpdate::Battery(reading) = telemetry.battery_step(&mut rng) else {
            panic!("expected a battery update");
        };

        assert!((reading.level - 88.0).abs() <= 2.0);
        assert_eq!(telemetry.battery().level(), reading.level);
    }

    #[test]
    fn test_update_serializes_with_card_tag() {
        let mut rng = rng();
        let json = serde_json::to_value(Telemetry::default().stats(&mut rng)).unwrap();

        assert_eq!(json["card"], "stats");
        assert!(json["onlineUsers"].is_u64());
    }
}
