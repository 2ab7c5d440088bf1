//! The session guard: owns the login state of one page.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Restoring a session from storage when a page loads
//! - Keeping the session alive while the visitor is active
//! - Noticing when the session has run out
//! - Logging in and out (with simulated latency)
//! - Sending visitors to the right page for their login state
//!
//! # Effects instead of side effects
//!
//! The guard never sleeps, never renders, and never navigates. Each
//! operation updates the store and the in-memory session, then returns the
//! [`Effect`]s the page should carry out. Anything that should happen
//! "later" comes back as [`Effect::Schedule`] or as a delayed
//! [`Effect::Navigate`]; the runtime owns the timers.
//!
//! # Concurrency note
//!
//! `SessionGuard` takes `&mut self` everywhere and is owned by a single
//! task. The store is the only thing shared with the outside world, and it
//! is read then written without transactions: two processes sharing one
//! file store can race, and the last write wins.

use chrono::{DateTime, Utc};
use kelas_protocol::{Codec, JsonCodec, Notice, Page, SessionExpiry, UserRecord, UserStats, keys};
use kelas_storage::KeyValueStore;

use crate::clock::later;
use crate::{
    Authenticator, Clock, Credentials, Effect, GuardTask, RouteTable, Session, SessionConfig,
    SessionError, SessionState,
};

/// Notice shown while the logout round-trip is pending.
pub const LOGGING_OUT_MESSAGE: &str = "Melakukan logout...";

/// Notice shown once the session has been cleared by a logout.
pub const LOGGED_OUT_MESSAGE: &str = "Logout berhasil";

/// Notice shown when an expired session sends the visitor back to log in.
pub const EXPIRED_MESSAGE: &str = "Sesi telah berakhir, silakan login kembali";

/// Guards one page against visitors without a valid session.
///
/// ## Lifecycle
///
/// ```text
///  restore() ──→ [Active] ──touch()──→ [Active, expiry pushed]
///      │            │
///      │            ├──logout(true)──→ Schedule(FinishLogout) ──→ [Anonymous]
///      │            │
///      │            └──check_expiry()──(expiry passed)──→ expire() ──→ [Anonymous]
///      ▼
///  [Anonymous] ──login()──→ Schedule(Authenticate) ──→ complete_login() ──→ [Active]
/// ```
pub struct SessionGuard<S, C, A> {
    store: S,
    clock: C,
    authenticator: A,
    codec: JsonCodec,
    config: SessionConfig,
    routes: RouteTable,

    /// The page this guard is protecting. Changes on navigation.
    page: Page,

    /// `Some` while the visitor is logged in. The expiry in here can lag
    /// the stored one if another process extended it.
    session: Option<Session>,
}

impl<S, C, A> SessionGuard<S, C, A>
where
    S: KeyValueStore,
    C: Clock,
    A: Authenticator,
{
    /// Creates a guard for `routes.entry` with no session loaded.
    ///
    /// Call [`set_page`](Self::set_page) then [`restore`](Self::restore)
    /// to emulate a page load.
    pub fn new(
        store: S,
        clock: C,
        authenticator: A,
        config: SessionConfig,
        routes: RouteTable,
    ) -> Self {
        let page = routes.entry.clone();
        Self {
            store,
            clock,
            authenticator,
            codec: JsonCodec,
            config: config.validated(),
            routes,
            page,
            session: None,
        }
    }

    // -- accessors ---------------------------------------------------------

    /// `Active` while a session is loaded and its expiry is still ahead.
    pub fn state(&self) -> SessionState {
        match &self.session {
            Some(session) if !session.expires_at.has_passed(self.clock.now()) => {
                SessionState::Active
            }
            _ => SessionState::Anonymous,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&UserRecord> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Points the guard at a newly loaded page. Does not touch the session.
    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // -- page load ---------------------------------------------------------

    /// Picks up a session left in storage by an earlier page.
    ///
    /// A stored record with an expiry still ahead becomes the active
    /// session and its expiry is pushed a full window forward. Anything
    /// else (missing keys, a record that won't decode, an unparseable or
    /// past expiry) is treated as no session and handed to
    /// [`expire`](Self::expire).
    pub fn restore(&mut self) -> Vec<Effect> {
        let now = self.clock.now();

        let stored = match self.read_session() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable session");
                None
            }
        };

        let Some(stored) = stored.filter(|s| !s.expires_at.has_passed(now)) else {
            return self.expire();
        };

        let expires_at = SessionExpiry(later(now, self.config.window));
        self.write_expiry(expires_at);

        tracing::info!(user = %stored.user.id, page = %self.page, "session restored");

        let user = stored.user;
        self.session = Some(Session {
            user: user.clone(),
            expires_at,
        });

        let mut effects = vec![Effect::ShowIdentity(user)];
        if let Some(target) = self.routes.redirect_for(&self.page, true) {
            effects.push(Effect::navigate_now(target.clone()));
        }
        effects
    }

    /// Sends the visitor to the page their login state allows, if the
    /// current one isn't it.
    pub fn enforce_routing(&self) -> Vec<Effect> {
        let authenticated = self.state() == SessionState::Active;
        match self.routes.redirect_for(&self.page, authenticated) {
            Some(target) => {
                tracing::debug!(from = %self.page, to = %target, authenticated, "redirecting");
                vec![Effect::navigate_now(target.clone())]
            }
            None => Vec::new(),
        }
    }

    // -- keep-alive --------------------------------------------------------

    /// Records visitor activity by pushing the expiry a full window ahead.
    ///
    /// Does nothing unless the session is [`Active`](SessionState::Active):
    /// activity never revives a session that has already run out. Returns
    /// `true` if the expiry moved.
    pub fn touch(&mut self) -> bool {
        let now = self.clock.now();
        let window = self.config.window;

        let expires_at = match &mut self.session {
            Some(session) if !session.expires_at.has_passed(now) => {
                session.expires_at = SessionExpiry(later(now, window));
                session.expires_at
            }
            _ => return false,
        };

        self.write_expiry(expires_at);
        tracing::trace!(expires_at = %expires_at.0, "session extended");
        true
    }

    /// Periodic check against the stored expiry.
    ///
    /// - No stored expiry: nothing to check, nothing happens.
    /// - Unparseable or passed: the session is over, see [`expire`](Self::expire).
    /// - Later than ours: another page extended it; adopt it.
    pub fn check_expiry(&mut self) -> Vec<Effect> {
        let now = self.clock.now();

        let text = match self.store.get(keys::SESSION_EXPIRY) {
            Ok(Some(text)) => text,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "expiry check skipped, store unreadable");
                return Vec::new();
            }
        };

        let stored = match SessionExpiry::parse(&text) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "stored expiry is malformed");
                return self.expire();
            }
        };

        if stored.has_passed(now) {
            tracing::info!(expired_at = %stored.0, "session ran out");
            return self.expire();
        }

        if let Some(session) = &mut self.session {
            if stored > session.expires_at {
                tracing::debug!(expires_at = %stored.0, "adopting later stored expiry");
                session.expires_at = stored;
            }
        }
        Vec::new()
    }

    // -- login -------------------------------------------------------------

    /// Starts a login.
    ///
    /// Accepted credentials come back inside an [`Effect::Schedule`]; the
    /// runtime hands them to [`run_task`](Self::run_task) once the
    /// simulated latency has passed.
    ///
    /// # Errors
    /// [`SessionError::Validation`] if a field is empty. Nothing is changed.
    pub fn login(&mut self, credentials: Credentials) -> Result<Vec<Effect>, SessionError> {
        credentials.validate()?;

        tracing::info!(username = %credentials.username, "login submitted");

        Ok(vec![Effect::Schedule {
            after: self.config.login_latency,
            task: GuardTask::Authenticate(credentials),
        }])
    }

    /// Runs the delayed half of a [`login`](Self::login) or
    /// [`logout`](Self::logout).
    pub fn run_task(&mut self, task: GuardTask) -> Vec<Effect> {
        match task {
            GuardTask::Authenticate(credentials) => {
                match self.authenticator.authenticate(&credentials, self.clock.now()) {
                    Ok(user) => self.complete_login(user),
                    Err(e) => {
                        tracing::warn!(
                            username = %credentials.username,
                            error = %e,
                            "login refused"
                        );
                        vec![Effect::Notify(Notice::error(e.to_string()))]
                    }
                }
            }
            GuardTask::FinishLogout => self.finish_logout(),
        }
    }

    /// Makes `user` the logged-in user.
    ///
    /// Persists the record with a fresh expiry, counts the login in the
    /// per-user statistics, greets the user, and moves on to the landing
    /// page after a short pause.
    pub fn complete_login(&mut self, user: UserRecord) -> Vec<Effect> {
        let now = self.clock.now();

        match self.codec.encode_str(&user) {
            Ok(text) => self.write(keys::CURRENT_USER, &text),
            Err(e) => tracing::warn!(user = %user.id, error = %e, "user record not persisted"),
        }

        let expires_at = SessionExpiry(later(now, self.config.window));
        self.write_expiry(expires_at);

        if let Err(e) = self.record_login(&user, now) {
            tracing::warn!(user = %user.id, error = %e, "login statistics not updated");
        }

        tracing::info!(user = %user.id, username = %user.username, "login completed");

        let greeting = Notice::success(format!("Selamat datang kembali, {}!", user.full_name));
        self.session = Some(Session {
            user: user.clone(),
            expires_at,
        });

        vec![
            Effect::ShowIdentity(user),
            Effect::Notify(greeting),
            Effect::Navigate {
                to: self.routes.landing.clone(),
                after: self.config.login_redirect_delay,
            },
        ]
    }

    // -- logout ------------------------------------------------------------

    /// Starts a logout. `confirmed` is the user's answer to "are you sure?";
    /// `false` does nothing.
    pub fn logout(&mut self, confirmed: bool) -> Vec<Effect> {
        if !confirmed {
            return Vec::new();
        }

        tracing::info!(page = %self.page, "logout requested");

        vec![
            Effect::Notify(Notice::info(LOGGING_OUT_MESSAGE)),
            Effect::Schedule {
                after: self.config.logout_latency,
                task: GuardTask::FinishLogout,
            },
        ]
    }

    /// Clears the session and heads back to the entry page.
    pub fn finish_logout(&mut self) -> Vec<Effect> {
        self.clear();
        tracing::info!("logged out");

        vec![
            Effect::Notify(Notice::success(LOGGED_OUT_MESSAGE)),
            Effect::Navigate {
                to: self.routes.entry.clone(),
                after: self.config.logout_redirect_delay,
            },
        ]
    }

    /// Drops the session.
    ///
    /// Off the entry page the visitor is told why and sent back there
    /// after a pause; on the entry page this is silent.
    pub fn expire(&mut self) -> Vec<Effect> {
        if let Some(session) = &self.session {
            tracing::info!(user = %session.user.id, "session expired");
        }
        self.clear();

        if self.page == self.routes.entry {
            return Vec::new();
        }

        vec![
            Effect::Notify(Notice::warning(EXPIRED_MESSAGE)),
            Effect::Navigate {
                to: self.routes.entry.clone(),
                after: self.config.expired_redirect_delay,
            },
        ]
    }

    // -- storage helpers ---------------------------------------------------

    /// Reads the stored record/expiry pair. `None` if either is missing.
    fn read_session(&self) -> Result<Option<Session>, SessionError> {
        let (Some(user), Some(expiry)) = (
            self.store.get(keys::CURRENT_USER)?,
            self.store.get(keys::SESSION_EXPIRY)?,
        ) else {
            return Ok(None);
        };

        Ok(Some(Session {
            user: self.codec.decode_str(&user)?,
            expires_at: SessionExpiry::parse(&expiry)?,
        }))
    }

    fn record_login(&self, user: &UserRecord, now: DateTime<Utc>) -> Result<(), SessionError> {
        let mut stats: UserStats = match self.store.get(keys::USER_STATS)? {
            Some(text) => self.codec.decode_str(&text).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "resetting unreadable login statistics");
                UserStats::default()
            }),
            None => UserStats::default(),
        };

        let entry = stats.record_login(user.id, now);
        tracing::debug!(user = %user.id, total_logins = entry.total_logins, "login counted");

        self.store
            .set(keys::USER_STATS, &self.codec.encode_str(&stats)?)?;
        Ok(())
    }

    fn write_expiry(&self, expires_at: SessionExpiry) {
        self.write(keys::SESSION_EXPIRY, &expires_at.to_storage_string());
    }

    // The state machine moves on even if the store refuses a write.
    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "store write failed");
        }
    }

    fn clear(&mut self) {
        self.session = None;
        for key in [keys::CURRENT_USER, keys::SESSION_EXPIRY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "store remove failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::TimeZone;
    use kelas_protocol::{DASHBOARD, INDEX, NoticeKind, PROFILE};
    use kelas_storage::MemoryStore;

    use super::*;
    use crate::{ManualClock, SimulatedAuthenticator};

    type TestGuard = SessionGuard<Arc<MemoryStore>, Arc<ManualClock>, SimulatedAuthenticator>;

    fn start() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn setup() -> (TestGuard, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(start()));
        let guard = SessionGuard::new(
            store.clone(),
            clock.clone(),
            SimulatedAuthenticator::default(),
            SessionConfig::default(),
            RouteTable::default(),
        );
        (guard, store, clock)
    }

    fn logged_in() -> (TestGuard, Arc<MemoryStore>, Arc<ManualClock>) {
        let (mut guard, store, clock) = setup();
        let user = SimulatedAuthenticator::default()
            .authenticate(&Credentials::new("budi", "x"), start())
            .unwrap();
        guard.complete_login(user);
        guard.set_page(Page::new(DASHBOARD));
        (guard, store, clock)
    }

    fn stored_expiry(store: &MemoryStore) -> Option<SessionExpiry> {
        store
            .get(keys::SESSION_EXPIRY)
            .unwrap()
            .map(|t| SessionExpiry::parse(&t).unwrap())
    }

    // =====================================================================
    // touch()
    // =====================================================================

    #[test]
    fn test_touch_active_pushes_expiry_with_one_write() {
        let (mut guard, store, clock) = logged_in();
        clock.advance(Duration::from_secs(600));
        let writes_before = store.writes();

        assert!(guard.touch());

        assert_eq!(store.writes(), writes_before + 1);
        let expected = SessionExpiry(later(clock.now(), Duration::from_secs(1800)));
        assert_eq!(stored_expiry(&store), Some(expected));
        assert_eq!(guard.session().unwrap().expires_at, expected);
    }

    #[test]
    fn test_touch_anonymous_is_noop() {
        let (mut guard, store, _) = setup();

        assert!(!guard.touch());

        assert_eq!(store.writes(), 0);
        assert!(store.is_empty());
        assert_eq!(guard.state(), SessionState::Anonymous);
    }

    #[test]
    fn test_touch_after_window_does_not_revive() {
        let (mut guard, store, clock) = logged_in();
        clock.advance(Duration::from_secs(1800));
        let writes_before = store.writes();

        assert!(!guard.touch());
        assert_eq!(store.writes(), writes_before);
        assert_eq!(guard.state(), SessionState::Anonymous);
    }

    // =====================================================================
    // check_expiry()
    // =====================================================================

    #[test]
    fn test_check_expiry_missing_key_is_noop() {
        let (mut guard, store, _) = logged_in();
        store.remove(keys::SESSION_EXPIRY).unwrap();

        assert!(guard.check_expiry().is_empty());
        assert!(guard.session().is_some());
    }

    #[test]
    fn test_check_expiry_passed_expires() {
        let (mut guard, store, clock) = logged_in();
        clock.advance(Duration::from_secs(1801));

        let effects = guard.check_expiry();

        assert!(guard.session().is_none());
        assert_eq!(store.get(keys::CURRENT_USER).unwrap(), None);
        assert!(matches!(&effects[0], Effect::Notify(n) if n.kind == NoticeKind::Warning));
    }

    #[test]
    fn test_check_expiry_malformed_expires() {
        let (mut guard, store, _) = logged_in();
        store.set(keys::SESSION_EXPIRY, "soon").unwrap();

        guard.check_expiry();

        assert!(guard.session().is_none());
        assert_eq!(store.get(keys::SESSION_EXPIRY).unwrap(), None);
    }

    #[test]
    fn test_check_expiry_adopts_later_stored_expiry() {
        let (mut guard, store, clock) = logged_in();
        let later_expiry = SessionExpiry(later(clock.now(), Duration::from_secs(3600)));
        store
            .set(keys::SESSION_EXPIRY, &later_expiry.to_storage_string())
            .unwrap();

        assert!(guard.check_expiry().is_empty());
        assert_eq!(guard.session().unwrap().expires_at, later_expiry);

        // Past our own window, but inside the adopted one.
        clock.advance(Duration::from_secs(2000));
        assert_eq!(guard.state(), SessionState::Active);
    }

    #[test]
    fn test_check_expiry_keeps_own_expiry_when_stored_is_earlier() {
        let (mut guard, store, clock) = logged_in();
        let ours = guard.session().unwrap().expires_at;
        let earlier = SessionExpiry(later(clock.now(), Duration::from_secs(60)));
        store
            .set(keys::SESSION_EXPIRY, &earlier.to_storage_string())
            .unwrap();

        guard.check_expiry();

        assert_eq!(guard.session().unwrap().expires_at, ours);
    }

    // =====================================================================
    // login() / run_task() / complete_login()
    // =====================================================================

    #[test]
    fn test_login_schedules_authentication() {
        let (mut guard, store, _) = setup();

        let effects = guard.login(Credentials::new("budi", "x")).unwrap();

        assert_eq!(
            effects,
            vec![Effect::Schedule {
                after: Duration::from_secs(2),
                task: GuardTask::Authenticate(Credentials::new("budi", "x")),
            }]
        );
        assert!(store.is_empty());
        assert!(guard.session().is_none());
    }

    #[test]
    fn test_run_task_authenticate_completes_login() {
        let (mut guard, _, _) = setup();

        let effects = guard.run_task(GuardTask::Authenticate(Credentials::new("siti", "x")));

        assert_eq!(guard.state(), SessionState::Active);
        assert_eq!(guard.user().unwrap().full_name, "Siti");
        assert!(matches!(&effects[0], Effect::ShowIdentity(u) if u.username == "siti"));
    }

    #[test]
    fn test_complete_login_effects_and_stats() {
        let (mut guard, store, _) = setup();
        let user = SimulatedAuthenticator::default()
            .authenticate(&Credentials::new("budi", "x"), start())
            .unwrap();

        let effects = guard.complete_login(user.clone());

        assert_eq!(effects.len(), 3);
        assert_eq!(
            effects[1],
            Effect::Notify(Notice::success("Selamat datang kembali, Budi!"))
        );
        assert_eq!(
            effects[2],
            Effect::Navigate {
                to: Page::new(DASHBOARD),
                after: Duration::from_millis(1500),
            }
        );

        let stats: UserStats =
            JsonCodec.decode_str(&store.get(keys::USER_STATS).unwrap().unwrap()).unwrap();
        assert_eq!(stats.get(user.id).unwrap().total_logins, 1);
    }

    #[test]
    fn test_complete_login_twice_counts_twice() {
        let (mut guard, store, _) = setup();
        let user = SimulatedAuthenticator::default()
            .authenticate(&Credentials::new("budi", "x"), start())
            .unwrap();

        guard.complete_login(user.clone());
        guard.complete_login(user.clone());

        let stats: UserStats =
            JsonCodec.decode_str(&store.get(keys::USER_STATS).unwrap().unwrap()).unwrap();
        assert_eq!(stats.get(user.id).unwrap().total_logins, 2);
    }

    #[test]
    fn test_complete_login_resets_corrupt_stats() {
        let (mut guard, store, _) = setup();
        store.set(keys::USER_STATS, "not json").unwrap();
        let user = SimulatedAuthenticator::default()
            .authenticate(&Credentials::new("budi", "x"), start())
            .unwrap();

        guard.complete_login(user.clone());

        let stats: UserStats =
            JsonCodec.decode_str(&store.get(keys::USER_STATS).unwrap().unwrap()).unwrap();
        assert_eq!(stats.len(), 1);
    }

    // =====================================================================
    // logout()
    // =====================================================================

    #[test]
    fn test_logout_unconfirmed_is_noop() {
        let (mut guard, store, _) = logged_in();
        let writes_before = store.writes();

        assert!(guard.logout(false).is_empty());

        assert_eq!(store.writes(), writes_before);
        assert!(guard.session().is_some());
    }

    #[test]
    fn test_logout_confirmed_defers_clearing() {
        let (mut guard, store, _) = logged_in();

        let effects = guard.logout(true);

        assert_eq!(effects[0], Effect::Notify(Notice::info(LOGGING_OUT_MESSAGE)));
        assert_eq!(
            effects[1],
            Effect::Schedule {
                after: Duration::from_secs(1),
                task: GuardTask::FinishLogout,
            }
        );
        // Still logged in until the scheduled task runs.
        assert!(store.get(keys::CURRENT_USER).unwrap().is_some());
        assert_eq!(guard.state(), SessionState::Active);
    }

    #[test]
    fn test_finish_logout_clears_and_navigates() {
        let (mut guard, store, _) = logged_in();

        let effects = guard.run_task(GuardTask::FinishLogout);

        assert_eq!(guard.state(), SessionState::Anonymous);
        assert_eq!(store.get(keys::CURRENT_USER).unwrap(), None);
        assert_eq!(store.get(keys::SESSION_EXPIRY).unwrap(), None);
        assert!(store.get(keys::USER_STATS).unwrap().is_some());
        assert_eq!(
            effects,
            vec![
                Effect::Notify(Notice::success(LOGGED_OUT_MESSAGE)),
                Effect::Navigate {
                    to: Page::new(INDEX),
                    after: Duration::from_secs(1),
                },
            ]
        );
    }

    // =====================================================================
    // expire() / enforce_routing()
    // =====================================================================

    #[test]
    fn test_expire_on_entry_page_is_silent() {
        let (mut guard, _, _) = logged_in();
        guard.set_page(Page::new(INDEX));

        assert!(guard.expire().is_empty());
        assert!(guard.session().is_none());
    }

    #[test]
    fn test_expire_off_entry_page_warns_then_redirects() {
        let (mut guard, _, _) = logged_in();
        guard.set_page(Page::new(PROFILE));

        let effects = guard.expire();

        assert_eq!(
            effects,
            vec![
                Effect::Notify(Notice::warning(EXPIRED_MESSAGE)),
                Effect::Navigate {
                    to: Page::new(INDEX),
                    after: Duration::from_secs(2),
                },
            ]
        );
    }

    #[test]
    fn test_enforce_routing_active_on_protected_stays() {
        let (guard, _, _) = logged_in();
        assert!(guard.enforce_routing().is_empty());
    }

    #[test]
    fn test_enforce_routing_anonymous_on_entry_stays() {
        let (guard, _, _) = setup();
        assert!(guard.enforce_routing().is_empty());
    }
}
