//! What the session guard asks the page to do.
//!
//! Guard operations never touch a page or a timer themselves. They return
//! a list of [`Effect`]s and let the caller (the portal runtime, or a
//! test) carry them out. That keeps every transition a plain function of
//! clock + store + input.

use std::time::Duration;

use kelas_protocol::{Notice, Page, UserRecord};

use crate::Credentials;

/// One thing the page should do in response to a guard operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show the logged-in identity (name, avatar, class) on the page.
    ShowIdentity(UserRecord),

    /// Display a transient notice.
    Notify(Notice),

    /// Load `to` after `after` has elapsed. `Duration::ZERO` means now.
    Navigate { to: Page, after: Duration },

    /// Call [`SessionGuard::run_task`](crate::SessionGuard::run_task) with
    /// `task` once `after` has elapsed.
    Schedule { after: Duration, task: GuardTask },
}

/// Deferred halves of guard operations that simulate latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardTask {
    /// Run the authenticator and complete the login.
    Authenticate(Credentials),
    /// Clear the session after the user confirmed logout.
    FinishLogout,
}

impl Effect {
    /// Shorthand for an immediate navigation.
    pub fn navigate_now(to: Page) -> Self {
        Self::Navigate {
            to,
            after: Duration::ZERO,
        }
    }
}
