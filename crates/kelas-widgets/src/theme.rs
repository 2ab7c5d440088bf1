//! The light/dark switch.

use kelas_protocol::{Theme, keys};
use kelas_storage::KeyValueStore;

use crate::WidgetError;

/// Holds the current theme and persists every change.
///
/// The saved flag is read once at construction; a missing or unknown
/// value means [`Theme::Light`].
pub struct ThemeController<S> {
    store: S,
    theme: Theme,
}

impl<S: KeyValueStore> ThemeController<S> {
    /// Reads the saved theme from `store`.
    ///
    /// # Errors
    /// [`WidgetError::Storage`] if the store can't be read.
    pub fn load(store: S) -> Result<Self, WidgetError> {
        let theme = store
            .get(keys::THEME)?
            .map(|flag| Theme::from_flag(&flag))
            .unwrap_or_default();
        tracing::debug!(%theme, "theme loaded");
        Ok(Self { store, theme })
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Icon for the toggle button: the theme a click would switch to.
    pub fn icon(&self) -> &'static str {
        self.theme.toggle_icon()
    }

    /// Flips the theme and saves it.
    ///
    /// # Errors
    /// [`WidgetError::Storage`] if the save fails. The theme is left
    /// unchanged in that case.
    pub fn toggle(&mut self) -> Result<Theme, WidgetError> {
        let next = self.theme.toggled();
        self.store.set(keys::THEME, next.as_str())?;
        self.theme = next;
        tracing::info!(theme = %next, "theme changed");
        Ok(next)
    }
}
