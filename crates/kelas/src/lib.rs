//! # Kelas
//!
//! Runtime for the Kelas 7F student portal.
//!
//! Kelas simulates the client side of a small school portal: a login page,
//! a dashboard behind it, a session that runs out after 30 idle minutes,
//! and a handful of widgets (assistant chat, telemetry cards, theme
//! switch). A [`Portal`] plays the role of one browser tab; it owns the
//! session guard and every timer the page would start.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kelas::prelude::*;
//! use tokio::sync::mpsc;
//!
//! # async fn demo() -> Result<(), PortalError> {
//! let mut portal = PortalBuilder::new()
//!     .config(PortalConfig::default())
//!     .build(SimulatedAuthenticator::default())?;
//! let first = portal.load(Page::new(INDEX));
//!
//! let (events_tx, events_rx) = mpsc::channel(16);
//! let (out_tx, mut out_rx) = mpsc::unbounded_channel();
//! tokio::spawn(portal.run(events_rx, out_tx));
//!
//! events_tx.send(PageEvent::Login(Credentials::new("budi", "x"))).await.ok();
//! while let Some(output) = out_rx.recv().await {
//!     println!("{output:?}");
//! }
//! # let _ = first;
//! # Ok(())
//! # }
//! ```

mod clock;
mod config;
mod error;
mod handler;
mod runtime;

pub use clock::TokioClock;
pub use config::{PortalConfig, TelemetryConfig};
pub use error::PortalError;
pub use runtime::{
    MAX_REDIRECT_HOPS, NoticeId, PageEvent, PageOutput, Portal, PortalBuilder, SharedClock,
    SharedStore,
};

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Calling this
/// twice is harmless; the second call does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub mod prelude {
    //! Everything a portal host needs in one import.

    pub use crate::{
        NoticeId, PageEvent, PageOutput, Portal, PortalBuilder, PortalConfig, PortalError,
        TelemetryConfig, TokioClock, init_tracing,
    };
    pub use kelas_protocol::{
        CLASS_7F, DASHBOARD, DeviceInfo, INDEX, Notice, NoticeKind, PROFILE, Page, Theme,
        UserRecord,
    };
    pub use kelas_session::{
        Authenticator, Clock, Credentials, ManualClock, RouteTable, SessionConfig, SessionState,
        SimulatedAuthenticator, SystemClock,
    };
    pub use kelas_storage::{FileStore, KeyValueStore, MemoryStore};
    pub use kelas_tick::TickPolicy;
    pub use kelas_widgets::{
        ChatMessage, PasswordMatch, StrengthLevel, TelemetryCard, TelemetryUpdate, all_charts,
        check_match, check_strength, format_long_date,
    };
}
