//! Which pages need a session, and where to send visitors who are on the
//! wrong side of that line.

use kelas_protocol::{DASHBOARD, INDEX, Page};
use serde::{Deserialize, Serialize};

/// The portal's page map.
///
/// Public pages are reachable without a session; every other page is
/// protected. Anonymous visitors on a protected page go to `entry`,
/// logged-in visitors on a public page go to `landing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub public: Vec<Page>,
    pub entry: Page,
    pub landing: Page,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            public: vec![Page::new(INDEX)],
            entry: Page::new(INDEX),
            landing: Page::new(DASHBOARD),
        }
    }
}

impl RouteTable {
    /// Returns `true` if `page` can be viewed without a session.
    pub fn is_public(&self, page: &Page) -> bool {
        self.public.contains(page)
    }

    /// Where a visitor on `page` must be sent, if anywhere.
    ///
    /// `None` when the visitor may stay, or when the target is the page
    /// they're already on.
    pub fn redirect_for(&self, page: &Page, authenticated: bool) -> Option<&Page> {
        let public = self.is_public(page);
        let target = match (authenticated, public) {
            (false, false) => &self.entry,
            (true, true) => &self.landing,
            _ => return None,
        };
        (target != page).then_some(target)
    }
}
