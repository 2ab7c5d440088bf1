//! Storage keys. These match what the browser portal used in local storage.

/// Serialized [`UserRecord`](crate::UserRecord) of the logged-in user.
pub const CURRENT_USER: &str = "currentUser";

/// [`SessionExpiry`](crate::SessionExpiry) in its millisecond text form.
pub const SESSION_EXPIRY: &str = "sessionExpiry";

/// Serialized [`UserStats`](crate::UserStats).
pub const USER_STATS: &str = "userStats";

/// [`Theme`](crate::Theme) flag, `"light"` or `"dark"`.
pub const THEME: &str = "theme";
