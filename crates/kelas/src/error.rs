//! Unified error type for the Kelas portal.

use kelas_protocol::ProtocolError;
use kelas_session::SessionError;
use kelas_storage::StorageError;
use kelas_tick::TickError;
use kelas_widgets::WidgetError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each wrapped variant generates the `From`
/// impl, so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// The key-value store failed (open, read, write).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A persisted record couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A timer setting couldn't be parsed.
    #[error(transparent)]
    Tick(#[from] TickError),

    /// A widget couldn't load or save its state.
    #[error(transparent)]
    Widget(#[from] WidgetError),

    /// The config file is not valid JSON for [`PortalConfig`](crate::PortalConfig).
    #[error("invalid config: {0}")]
    Config(String),

    /// The config file couldn't be read.
    #[error("config file: {0}")]
    Io(#[from] std::io::Error),
}
