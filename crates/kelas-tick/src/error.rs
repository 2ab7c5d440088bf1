/// Errors from parsing timer configuration.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The policy name isn't one of `skip`, `drop`, `catch-up[:N]`.
    #[error("unknown tick policy: {0:?}")]
    UnknownPolicy(String),

    /// `catch-up:N` with an `N` that isn't a non-negative integer.
    #[error("invalid catch-up limit: {0:?}")]
    InvalidCatchUp(String),
}
