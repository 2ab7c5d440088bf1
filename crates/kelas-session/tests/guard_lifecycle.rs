//! Integration tests for the session guard across simulated page loads.
//!
//! A "page load" is a fresh `SessionGuard` over the same store and clock,
//! pointed at a page and restored, which is exactly what the portal
//! runtime does on navigation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use kelas_protocol::{
    CLASS_7F, Codec, DASHBOARD, INDEX, JsonCodec, Notice, PROFILE, Page, SessionExpiry,
    UserRecord, keys,
};
use kelas_session::{
    Authenticator, Clock, Credentials, EMPTY_FIELD_MESSAGE, EXPIRED_MESSAGE, Effect, GuardTask,
    ManualClock, RouteTable, SessionConfig, SessionError, SessionGuard, SessionState,
    SimulatedAuthenticator,
};
use kelas_storage::{KeyValueStore, MemoryStore, StorageError};

// =========================================================================
// Fixtures
// =========================================================================

type Guard<S = Arc<MemoryStore>, A = SimulatedAuthenticator> = SessionGuard<S, Arc<ManualClock>, A>;

fn start() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

struct Browser {
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
}

impl Browser {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::new(start())),
        }
    }

    /// A fresh guard on `page`, before `restore()`.
    fn open(&self, page: &str) -> Guard {
        let mut guard = SessionGuard::new(
            self.store.clone(),
            self.clock.clone(),
            SimulatedAuthenticator::default(),
            SessionConfig::default(),
            RouteTable::default(),
        );
        guard.set_page(Page::new(page));
        guard
    }

    /// A fresh guard on `page`, restored. Returns the restore effects too.
    fn load(&self, page: &str) -> (Guard, Vec<Effect>) {
        let mut guard = self.open(page);
        let effects = guard.restore();
        (guard, effects)
    }

    fn stored_expiry(&self) -> Option<SessionExpiry> {
        self.store
            .get(keys::SESSION_EXPIRY)
            .unwrap()
            .map(|t| SessionExpiry::parse(&t).unwrap())
    }

    fn stored_user(&self) -> Option<UserRecord> {
        self.store
            .get(keys::CURRENT_USER)
            .unwrap()
            .map(|t| JsonCodec.decode_str(&t).unwrap())
    }

    /// Runs the login flow to completion on the entry page.
    fn log_in(&self, username: &str) -> UserRecord {
        let (mut guard, _) = self.load(INDEX);
        let effects = guard.login(Credentials::new(username, "x")).unwrap();
        let Effect::Schedule { after, task } = effects[0].clone() else {
            panic!("login should schedule authentication, got {effects:?}");
        };
        self.clock.advance(after);
        guard.run_task(task);
        guard.user().cloned().unwrap()
    }
}

fn navigations(effects: &[Effect]) -> Vec<(&str, Duration)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Navigate { to, after } => Some((to.as_str(), *after)),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Login validation
// =========================================================================

#[test]
fn test_login_empty_fields_rejected_without_mutation() {
    let browser = Browser::new();
    let (mut guard, _) = browser.load(INDEX);
    let writes_before = browser.store.writes();

    for (user, pass) in [("", ""), ("budi", ""), ("", "x")] {
        let result = guard.login(Credentials::new(user, pass));
        assert!(
            matches!(&result, Err(SessionError::Validation(m)) if m == EMPTY_FIELD_MESSAGE),
            "({user:?}, {pass:?}) should be rejected"
        );
    }

    assert_eq!(browser.store.writes(), writes_before);
    assert_eq!(guard.state(), SessionState::Anonymous);
    assert!(guard.session().is_none());
}

#[test]
fn test_login_whitespace_fields_are_filled() {
    let browser = Browser::new();
    let (mut guard, _) = browser.load(INDEX);

    assert!(guard.login(Credentials::new("  ", " ")).is_ok());
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_login_budi_persists_profile_and_expiry() {
    let browser = Browser::new();
    let (mut guard, _) = browser.load(INDEX);

    let effects = guard.login(Credentials::new("budi", "x")).unwrap();
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            after: Duration::from_secs(2),
            task: GuardTask::Authenticate(Credentials::new("budi", "x")),
        }]
    );

    browser.clock.advance(Duration::from_secs(2));
    let Effect::Schedule { task, .. } = effects[0].clone() else {
        unreachable!()
    };
    let effects = guard.run_task(task);

    let record = browser.stored_user().unwrap();
    assert_eq!(record.full_name, "Budi");
    assert_eq!(record.role, "student");
    assert_eq!(record.email, "budi@gmail.com");

    let expected = browser.clock.now() + TimeDelta::minutes(30);
    assert_eq!(browser.stored_expiry(), Some(SessionExpiry(expected)));

    assert!(effects.contains(&Effect::Notify(Notice::success(
        "Selamat datang kembali, Budi!"
    ))));
    assert_eq!(
        navigations(&effects),
        vec![(DASHBOARD, Duration::from_millis(1500))]
    );
}

#[test]
fn test_restore_expiry_one_ms_ago_clears_and_redirects() {
    let browser = Browser::new();
    let user = browser.log_in("budi");
    let past = SessionExpiry(browser.clock.now() - TimeDelta::milliseconds(1));
    browser
        .store
        .set(keys::SESSION_EXPIRY, &past.to_storage_string())
        .unwrap();

    let (guard, effects) = browser.load(PROFILE);

    assert_eq!(guard.state(), SessionState::Anonymous);
    assert_eq!(browser.store.get(keys::CURRENT_USER).unwrap(), None);
    assert_eq!(browser.store.get(keys::SESSION_EXPIRY).unwrap(), None);
    assert!(effects.contains(&Effect::Notify(Notice::warning(EXPIRED_MESSAGE))));
    assert_eq!(navigations(&effects), vec![(INDEX, Duration::from_secs(2))]);

    // The login statistics outlive the session.
    let stats = browser.store.get(keys::USER_STATS).unwrap().unwrap();
    assert!(stats.contains(&user.id.0.to_string()));
}

#[test]
fn test_restore_expired_on_entry_page_is_silent() {
    let browser = Browser::new();
    browser.log_in("budi");
    browser.clock.advance(Duration::from_secs(31 * 60));

    let (guard, effects) = browser.load(INDEX);

    assert_eq!(guard.state(), SessionState::Anonymous);
    assert!(effects.is_empty());
    assert_eq!(browser.stored_user(), None);
}

// =========================================================================
// Restore across page loads
// =========================================================================

#[test]
fn test_restore_after_login_same_identity() {
    let browser = Browser::new();
    let user = browser.log_in("siti");
    browser.clock.advance(Duration::from_secs(60));

    let (guard, effects) = browser.load(DASHBOARD);

    assert_eq!(guard.state(), SessionState::Active);
    assert_eq!(guard.user(), Some(&user));
    assert_eq!(effects, vec![Effect::ShowIdentity(user)]);
}

#[test]
fn test_restore_extends_expiry_by_window() {
    let browser = Browser::new();
    browser.log_in("siti");
    browser.clock.advance(Duration::from_secs(20 * 60));

    browser.load(CLASS_7F);

    let expected = browser.clock.now() + TimeDelta::minutes(30);
    assert_eq!(browser.stored_expiry(), Some(SessionExpiry(expected)));
}

#[test]
fn test_restore_on_entry_page_redirects_to_landing() {
    let browser = Browser::new();
    browser.log_in("siti");

    let (_, effects) = browser.load(INDEX);

    assert_eq!(navigations(&effects), vec![(DASHBOARD, Duration::ZERO)]);
}

#[test]
fn test_restore_past_expiry_always_anonymous() {
    for minutes_late in [0_i64, 1, 60, 60 * 24 * 365] {
        let browser = Browser::new();
        browser.log_in("budi");
        browser.clock.advance(Duration::from_secs(30 * 60));
        browser
            .clock
            .advance(Duration::from_secs(60 * u64::try_from(minutes_late).unwrap()));

        let (guard, _) = browser.load(DASHBOARD);

        assert_eq!(guard.state(), SessionState::Anonymous, "{minutes_late} min late");
        assert_eq!(browser.stored_expiry(), None);
    }
}

#[test]
fn test_restore_missing_or_corrupt_state_is_anonymous() {
    let cases: [(Option<&str>, Option<&str>); 4] = [
        (None, Some("1700000999999")),
        (Some("{}"), None),
        (Some("not json"), Some("1700000999999")),
        (Some("{}"), Some("tomorrow")),
    ];

    for (user, expiry) in cases {
        let browser = Browser::new();
        if let Some(user) = user {
            browser.store.set(keys::CURRENT_USER, user).unwrap();
        }
        if let Some(expiry) = expiry {
            browser.store.set(keys::SESSION_EXPIRY, expiry).unwrap();
        }

        let (guard, _) = browser.load(PROFILE);

        assert_eq!(guard.state(), SessionState::Anonymous, "{user:?} / {expiry:?}");
        assert!(browser.store.is_empty(), "{user:?} / {expiry:?}");
    }
}

// =========================================================================
// Activity and expiry
// =========================================================================

#[test]
fn test_touch_anonymous_never_creates_session() {
    let browser = Browser::new();
    let (mut guard, _) = browser.load(INDEX);

    for _ in 0..10 {
        assert!(!guard.touch());
        browser.clock.advance(Duration::from_secs(1));
    }

    assert!(browser.store.is_empty());
    assert_eq!(guard.state(), SessionState::Anonymous);
}

#[test]
fn test_activity_keeps_session_alive_past_window() {
    let browser = Browser::new();
    browser.log_in("budi");
    let (mut guard, _) = browser.load(DASHBOARD);

    // Two hours of activity every ten minutes, checking once a minute.
    for _ in 0..12 {
        for _ in 0..10 {
            browser.clock.advance(Duration::from_secs(60));
            assert!(guard.check_expiry().is_empty());
        }
        assert!(guard.touch());
    }

    assert_eq!(guard.state(), SessionState::Active);
}

#[test]
fn test_idle_session_expires_on_check() {
    let browser = Browser::new();
    browser.log_in("budi");
    let (mut guard, _) = browser.load(DASHBOARD);

    let mut effects = Vec::new();
    for _ in 0..31 {
        browser.clock.advance(Duration::from_secs(60));
        effects = guard.check_expiry();
        if !effects.is_empty() {
            break;
        }
    }

    assert_eq!(guard.state(), SessionState::Anonymous);
    assert_eq!(navigations(&effects), vec![(INDEX, Duration::from_secs(2))]);
}

#[test]
fn test_check_expiry_sees_extension_from_other_page() {
    let browser = Browser::new();
    browser.log_in("budi");
    let (mut first, _) = browser.load(DASHBOARD);
    let (mut second, _) = browser.load(PROFILE);

    browser.clock.advance(Duration::from_secs(20 * 60));
    assert!(second.touch());
    browser.clock.advance(Duration::from_secs(15 * 60));

    // `first` was never touched, but the store says the session is alive.
    assert!(first.check_expiry().is_empty());
    assert_eq!(first.state(), SessionState::Active);
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_enforce_routing_anonymous_on_protected_redirects_to_entry() {
    let browser = Browser::new();
    for page in [DASHBOARD, PROFILE, CLASS_7F] {
        let guard = browser.open(page);
        assert_eq!(
            navigations(&guard.enforce_routing()),
            vec![(INDEX, Duration::ZERO)]
        );
    }
}

#[test]
fn test_enforce_routing_active_on_entry_redirects_to_landing() {
    let browser = Browser::new();
    browser.log_in("budi");
    let mut guard = browser.open(INDEX);
    // Restore without acting on its own redirect, then ask again.
    guard.restore();

    assert_eq!(
        navigations(&guard.enforce_routing()),
        vec![(DASHBOARD, Duration::ZERO)]
    );
}

// =========================================================================
// Logout
// =========================================================================

#[test]
fn test_logout_full_flow() {
    let browser = Browser::new();
    browser.log_in("budi");
    let (mut guard, _) = browser.load(DASHBOARD);

    let effects = guard.logout(true);
    let Some(Effect::Schedule { after, task }) = effects.last().cloned() else {
        panic!("logout should schedule the finish, got {effects:?}");
    };
    assert_eq!(after, Duration::from_secs(1));

    browser.clock.advance(after);
    let effects = guard.run_task(task);

    assert_eq!(guard.state(), SessionState::Anonymous);
    assert_eq!(navigations(&effects), vec![(INDEX, Duration::from_secs(1))]);

    let (next, effects) = browser.load(INDEX);
    assert_eq!(next.state(), SessionState::Anonymous);
    assert!(effects.is_empty());
}

// =========================================================================
// Collaborators that fail
// =========================================================================

struct Refuse;

impl Authenticator for Refuse {
    fn authenticate(
        &self,
        credentials: &Credentials,
        _now: DateTime<Utc>,
    ) -> Result<UserRecord, SessionError> {
        Err(SessionError::AuthFailed(format!("unknown user {}", credentials.username)))
    }
}

#[test]
fn test_refused_login_stays_anonymous() {
    let store = Arc::new(MemoryStore::new());
    let mut guard: Guard<_, Refuse> = SessionGuard::new(
        store.clone(),
        Arc::new(ManualClock::new(start())),
        Refuse,
        SessionConfig::default(),
        RouteTable::default(),
    );

    let effects = guard.run_task(GuardTask::Authenticate(Credentials::new("eve", "x")));

    assert_eq!(guard.state(), SessionState::Anonymous);
    assert!(store.is_empty());
    assert!(matches!(&effects[..], [Effect::Notify(n)] if n.message.contains("eve")));
}

/// Reads work, writes always fail.
#[derive(Default)]
struct ReadOnly(MemoryStore);

impl KeyValueStore for ReadOnly {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Poisoned)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Poisoned)
    }
}

#[test]
fn test_store_write_failures_do_not_change_outcome() {
    let clock = Arc::new(ManualClock::new(start()));
    let mut guard: Guard<ReadOnly> = SessionGuard::new(
        ReadOnly::default(),
        clock.clone(),
        SimulatedAuthenticator::default(),
        SessionConfig::default(),
        RouteTable::default(),
    );

    let effects = guard.run_task(GuardTask::Authenticate(Credentials::new("budi", "x")));
    assert_eq!(guard.state(), SessionState::Active);
    assert_eq!(navigations(&effects), vec![(DASHBOARD, Duration::from_millis(1500))]);

    assert!(guard.touch());

    guard.set_page(Page::new(DASHBOARD));
    let effects = guard.expire();
    assert_eq!(guard.state(), SessionState::Anonymous);
    assert_eq!(navigations(&effects), vec![(INDEX, Duration::from_secs(2))]);
}
