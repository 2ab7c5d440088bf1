//! Session lifecycle for Kelas.
//!
//! This crate decides who is logged in and which pages they may see:
//!
//! 1. **Authentication**: turning login form input into a user record
//!    ([`Authenticator`] trait, [`SimulatedAuthenticator`])
//! 2. **Session tracking**: restoring, extending, and expiring the session
//!    kept in the key-value store ([`SessionGuard`])
//! 3. **Routing**: keeping anonymous visitors off protected pages and
//!    logged-in users off the login page ([`RouteTable`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Portal runtime (above)  ← interprets Effects, owns the timers
//!     ↕
//! Session Layer (this crate)  ← pure transitions over store + clock
//!     ↕
//! Protocol + Storage (below)  ← UserRecord, SessionExpiry, KeyValueStore
//! ```

mod auth;
mod clock;
mod effect;
mod error;
mod guard;
mod routes;
mod session;

pub use auth::{
    Authenticator, Credentials, EMPTY_FIELD_MESSAGE, LOCATIONS, SimulatedAuthenticator,
    capitalize_name, encode_uri_component,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use effect::{Effect, GuardTask};
pub use error::SessionError;
pub use guard::{EXPIRED_MESSAGE, LOGGED_OUT_MESSAGE, LOGGING_OUT_MESSAGE, SessionGuard};
pub use routes::RouteTable;
pub use session::{Session, SessionConfig, SessionState};
