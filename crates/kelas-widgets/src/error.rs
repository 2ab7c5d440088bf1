use kelas_storage::StorageError;

/// Errors from widgets that persist state.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
