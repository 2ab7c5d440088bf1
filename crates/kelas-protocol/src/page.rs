//! Page-level types: page identities, display theme, and notices.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// The public entry (login) page.
pub const INDEX: &str = "index.html";
/// The main landing page after login.
pub const DASHBOARD: &str = "dashboard.html";
/// The user's profile and settings page.
pub const PROFILE: &str = "profile.html";
/// The class overview page.
pub const CLASS_7F: &str = "class-7f.html";

/// Identity of a portal page: its file name, e.g. `"dashboard.html"`.
///
/// Navigation is a full page load, so a page is identified by nothing more
/// than the last segment of its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(String);

impl Page {
    /// Wraps a page file name as-is.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Takes the last `/`-separated segment of a URL path.
    ///
    /// `"/portal/profile.html"` → `"profile.html"`. A query string or
    /// fragment is dropped first. A path ending in `/` yields the empty
    /// page name, which no route table lists as public.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let name = path.rsplit('/').next().unwrap_or_default();
        Self(name.to_string())
    }

    /// The page file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Page {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Display mode, persisted under [`keys::THEME`](crate::keys::THEME).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The stored flag value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Reads a stored flag. Anything other than `"dark"` is light.
    pub fn from_flag(flag: &str) -> Self {
        if flag == "dark" { Self::Dark } else { Self::Light }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Icon shown on the toggle button: the theme you'd switch *to*.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Self::Light => "fa-moon",
            Self::Dark => "fa-sun",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeKind {
    /// Font Awesome icon name.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "check-circle",
            Self::Error => "exclamation-circle",
            Self::Warning => "exclamation-triangle",
            Self::Info => "info-circle",
        }
    }

    /// Background color as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            Self::Success => "#10b981",
            Self::Error => "#ef4444",
            Self::Warning => "#f59e0b",
            Self::Info => "#3b82f6",
        }
    }
}

/// A short message shown to the user for a few seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_path_takes_last_segment() {
        assert_eq!(Page::from_path("/portal/profile.html").as_str(), PROFILE);
        assert_eq!(Page::from_path("dashboard.html").as_str(), DASHBOARD);
    }

    #[test]
    fn test_page_from_path_drops_query_and_fragment() {
        assert_eq!(Page::from_path("/a/index.html?next=x").as_str(), INDEX);
        assert_eq!(Page::from_path("/a/class-7f.html#jadwal").as_str(), CLASS_7F);
    }

    #[test]
    fn test_page_from_path_trailing_slash_is_empty() {
        assert_eq!(Page::from_path("/portal/").as_str(), "");
    }

    #[test]
    fn test_page_serializes_as_plain_string() {
        let json = serde_json::to_string(&Page::new(INDEX)).unwrap();
        assert_eq!(json, "\"index.html\"");
    }

    #[test]
    fn test_theme_from_flag_unknown_is_light() {
        assert_eq!(Theme::from_flag("dark"), Theme::Dark);
        assert_eq!(Theme::from_flag("light"), Theme::Light);
        assert_eq!(Theme::from_flag("solarized"), Theme::Light);
        assert_eq!(Theme::from_flag(""), Theme::Light);
    }

    #[test]
    fn test_theme_toggle_and_icon() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Dark.toggle_icon(), "fa-sun");
        assert_eq!(Theme::Light.toggle_icon(), "fa-moon");
    }

    #[test]
    fn test_notice_kind_styling() {
        assert_eq!(NoticeKind::Warning.icon(), "exclamation-triangle");
        assert_eq!(NoticeKind::Error.color(), "#ef4444");
        assert_eq!(Notice::info("x").kind, NoticeKind::Info);
    }
}
