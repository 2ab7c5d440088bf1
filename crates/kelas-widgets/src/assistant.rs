//! The chat assistant.
//!
//! Not a language model: a list of keyword groups checked in order, each
//! with a canned reply about class 7F. Matching is a lowercase substring
//! test, so `"pr"` also fires inside `"prestasi"`. First match wins.

use chrono::Timelike;
use serde::Serialize;

use crate::format_hhmm;

/// Reply when no keyword matches.
pub const FALLBACK_REPLY: &str =
    "Maaf, saya belum memahami pertanyaan Anda. Coba tanyakan tentang siswa, guru, jadwal, atau tugas.";

/// Battery text used when no telemetry has been sampled yet.
pub const BATTERY_FALLBACK: &str = "75%";

const GREETING_REPLY: &str = "Halo! Saya AI Assistant. Ada yang bisa saya bantu?";

enum Reply {
    Canned(&'static str),
    /// Reports the battery text shown on the page.
    Battery,
}

static RULES: [(&[&str], Reply); 8] = [
    (
        &["siswa", "murid"],
        Reply::Canned(
            "Kelas 7F memiliki 32 siswa aktif. Anda bisa melihat daftar lengkapnya di halaman Kelas 7F.",
        ),
    ),
    (
        &["guru", "pembimbing"],
        Reply::Canned(
            "Wali kelas 7F adalah Bu Sari Indah, S.Pd. Ada total 5 guru yang mengajar di kelas 7F.",
        ),
    ),
    (
        &["jadwal", "pelajaran"],
        Reply::Canned(
            "Jadwal pelajaran kelas 7F tersedia di halaman Kelas 7F. Senin sampai Jumat, mulai jam 07:00 - 13:30.",
        ),
    ),
    (
        &["tugas", "pr"],
        Reply::Canned(
            "Saat ini ada 5 tugas yang harus diselesaikan. Cek di dashboard untuk detail lebih lanjut.",
        ),
    ),
    (
        &["nilai", "rapor"],
        Reply::Canned(
            "Nilai terbaru akan diumumkan minggu depan. Pastikan semua tugas sudah diselesaikan!",
        ),
    ),
    (
        &["profile", "akun"],
        Reply::Canned(
            "Anda bisa mengatur profile dan pengaturan akun di halaman Profile.",
        ),
    ),
    (&["baterai", "battery"], Reply::Battery),
    (&["halo", "hai", "hi"], Reply::Canned(GREETING_REPLY)),
];

/// Replies to `message`, or `None` if it's blank.
///
/// `battery` is the battery text currently on the page (e.g. `"82%"`);
/// [`BATTERY_FALLBACK`] stands in when there is none.
pub fn respond(message: &str, battery: Option<&str>) -> Option<String> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    let lower = message.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let reply = RULES
        .iter()
        .find(|rule| mentions(rule.0))
        .map(|(_, reply)| match reply {
            Reply::Canned(text) => (*text).to_string(),
            Reply::Battery => {
                format!("Status baterai sistem: {}", battery.unwrap_or(BATTERY_FALLBACK))
            }
        })
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());
    Some(reply)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One line in the chat window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    /// `HH:MM` at which the line was added.
    pub time: String,
}

impl ChatMessage {
    pub fn new<T: Timelike>(sender: Sender, text: impl Into<String>, at: &T) -> Self {
        Self {
            sender,
            text: text.into(),
            time: format_hhmm(at),
        }
    }
}
