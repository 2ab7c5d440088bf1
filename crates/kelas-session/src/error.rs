//! Error types for the session layer.

use kelas_protocol::ProtocolError;
use kelas_storage::StorageError;

/// Errors that can occur during session management.
///
/// Only [`Validation`](Self::Validation) reaches the user as-is; the rest
/// are logged and, from the visitor's point of view, look like "no session".
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The login form was incomplete. Carries the message shown inline.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The [`Authenticator`](crate::Authenticator) refused the credentials.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The key-value store failed underneath the guard.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A persisted record couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
