//! `Portal` builder and event loop.
//!
//! A [`Portal`] stands in for one browser tab. It owns the session guard,
//! the widgets and every timer the page would start, and it runs on a
//! single Tokio task:
//!
//! ```text
//! PageEvent (mpsc) ──┐
//! expiry ticker  ────┤
//! telemetry tickers ─┼─► Portal::run ─► PageOutput (mpsc)
//! deferred queue ────┘
//! ```
//!
//! Each status-card group has its own ticker: the clock every second,
//! server stats every 3, the battery every 5, the IP address every 15.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use kelas_protocol::{Notice, Page, Theme, UserRecord};
use kelas_session::{Authenticator, Clock, Credentials, SessionGuard, SessionState};
use kelas_storage::{FileStore, KeyValueStore, MemoryStore};
use kelas_tick::{DeferredId, DeferredQueue, TickInfo, Ticker};
use kelas_widgets::{ChatMessage, Telemetry, TelemetryCard, TelemetryUpdate, ThemeController};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::handler::Deferred;
use crate::config::TelemetryConfig;
use crate::{PortalConfig, PortalError, TokioClock};

/// The key-value store as the portal shares it between the guard and the
/// theme switch.
pub type SharedStore = Arc<dyn KeyValueStore>;

pub type SharedClock = Arc<dyn Clock>;

/// Immediate redirects followed in a row before the portal gives up and
/// stays on the current page.
pub const MAX_REDIRECT_HOPS: usize = 4;

// ---------------------------------------------------------------------------
// Events and outputs
// ---------------------------------------------------------------------------

/// Handle for a notice on screen, used to dismiss it early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NoticeId(pub u64);

impl fmt::Display for NoticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notice-{}", self.0)
    }
}

/// Something the visitor did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Pointer move, key press, or click anywhere on the page.
    Activity,
    /// Login form submitted.
    Login(Credentials),
    /// Logout button; `confirmed` is the answer to "are you sure?".
    Logout { confirmed: bool },
    /// A line typed into the assistant's chat box.
    Chat(String),
    ToggleTheme,
    /// The close button on a notice.
    Dismiss(NoticeId),
    /// The visitor typed an address or followed a link.
    Visit(Page),
    /// Close the tab.
    Shutdown,
}

/// Something the page should render.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutput {
    /// A new page was loaded. Everything the old one showed is gone.
    Navigated(Page),
    Notice { id: NoticeId, notice: Notice },
    /// A notice timed out or was closed.
    NoticeDismissed(NoticeId),
    /// Name, avatar and class of the logged-in user.
    Identity(UserRecord),
    /// Inline message under the login form.
    LoginRejected(String),
    /// The visitor's own line, added to the chat window as sent.
    ChatSent(ChatMessage),
    ChatReply(ChatMessage),
    Telemetry(TelemetryUpdate),
    Theme(Theme),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for a [`Portal`].
///
/// # Example
///
/// ```rust,ignore
/// use kelas::prelude::*;
///
/// let mut portal = PortalBuilder::new()
///     .config(config)
///     .store(MemoryStore::new())
///     .build(SimulatedAuthenticator::default())?;
/// let outputs = portal.load(Page::new(INDEX));
/// ```
pub struct PortalBuilder {
    config: PortalConfig,
    store: Option<SharedStore>,
    clock: Option<SharedClock>,
}

impl PortalBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: PortalConfig::default(),
            store: None,
            clock: None,
        }
    }

    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `store` instead of the one named by the config.
    pub fn store(mut self, store: impl KeyValueStore) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Uses `clock` instead of a [`TokioClock`] started at build time.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Builds the portal with the given authenticator.
    ///
    /// Without an explicit store, opens a [`FileStore`] at the configured
    /// `storage_path`, or falls back to a [`MemoryStore`]. Must be called
    /// inside a Tokio runtime.
    ///
    /// # Errors
    /// - [`PortalError::Storage`] if the store file can't be opened
    /// - [`PortalError::Widget`] if the saved theme can't be read
    pub fn build<A: Authenticator>(self, authenticator: A) -> Result<Portal<A>, PortalError> {
        let config = self.config.validated();

        let store: SharedStore = match (self.store, &config.storage_path) {
            (Some(store), _) => store,
            (None, Some(path)) => Arc::new(FileStore::open(path)?) as SharedStore,
            (None, None) => Arc::new(MemoryStore::new()) as SharedStore,
        };
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(TokioClock::new()) as SharedClock);

        let theme = ThemeController::load(Arc::clone(&store))?;
        let guard = SessionGuard::new(
            store,
            clock,
            authenticator,
            config.session.clone(),
            config.routes.clone(),
        );

        let expiry_ticker = Ticker::every(config.session.check_interval);
        let card_tickers = CardTickers::new(&config.telemetry);

        tracing::debug!(
            check_ms = config.session.check_interval.as_millis(),
            clock_ms = config.telemetry.clock_period.as_millis(),
            stats_ms = config.telemetry.stats_period.as_millis(),
            battery_ms = config.telemetry.battery_period.as_millis(),
            network_ms = config.telemetry.network_period.as_millis(),
            "portal built"
        );

        Ok(Portal {
            config,
            guard,
            theme,
            telemetry: Telemetry::default(),
            battery_text: None,
            deferred: DeferredQueue::new(),
            notices: HashMap::new(),
            next_notice: 0,
            expiry_ticker,
            card_tickers,
            loaded_at: Instant::now(),
        })
    }
}

impl Default for PortalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Telemetry tickers
// ---------------------------------------------------------------------------

/// One ticker per status-card group.
pub(crate) struct CardTickers {
    clock: Ticker,
    battery: Ticker,
    stats: Ticker,
    network: Ticker,
}

impl CardTickers {
    fn new(config: &TelemetryConfig) -> Self {
        Self {
            clock: Ticker::new(config.ticker(TelemetryCard::Clock)),
            battery: Ticker::new(config.ticker(TelemetryCard::Battery)),
            stats: Ticker::new(config.ticker(TelemetryCard::Stats)),
            network: Ticker::new(config.ticker(TelemetryCard::Network)),
        }
    }

    /// Restarts every group from now.
    pub(crate) fn reset(&mut self) {
        self.clock.reset();
        self.battery.reset();
        self.stats.reset();
        self.network.reset();
    }

    /// Waits for the next group that is due. Pends forever when every
    /// group is off.
    pub(crate) async fn next_due(&mut self) -> (TelemetryCard, TickInfo) {
        tokio::select! {
            tick = self.clock.wait_for_tick() => (TelemetryCard::Clock, tick),
            tick = self.battery.wait_for_tick() => (TelemetryCard::Battery, tick),
            tick = self.stats.wait_for_tick() => (TelemetryCard::Stats, tick),
            tick = self.network.wait_for_tick() => (TelemetryCard::Network, tick),
        }
    }
}

// ---------------------------------------------------------------------------
// Portal
// ---------------------------------------------------------------------------

/// One open portal tab.
///
/// Call [`load`](Self::load) for the first page, then hand the portal to
/// [`run`](Self::run). Tests can also drive it step by step with
/// [`handle_event`](Self::handle_event).
pub struct Portal<A> {
    pub(crate) config: PortalConfig,
    pub(crate) guard: SessionGuard<SharedStore, SharedClock, A>,
    pub(crate) theme: ThemeController<SharedStore>,
    pub(crate) telemetry: Telemetry,
    /// Battery text last shown on the page, for the assistant.
    pub(crate) battery_text: Option<String>,
    pub(crate) deferred: DeferredQueue<Deferred>,
    /// Notices on screen and the timers that will take them down.
    pub(crate) notices: HashMap<NoticeId, DeferredId>,
    pub(crate) next_notice: u64,
    pub(crate) expiry_ticker: Ticker,
    pub(crate) card_tickers: CardTickers,
    pub(crate) loaded_at: Instant,
}

impl<A: Authenticator> Portal<A> {
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// The page currently loaded.
    pub fn page(&self) -> &Page {
        self.guard.page()
    }

    pub fn session_state(&self) -> SessionState {
        self.guard.state()
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.guard.user()
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn store(&self) -> &SharedStore {
        self.guard.store()
    }

    /// Notices currently on screen.
    pub fn notice_count(&self) -> usize {
        self.notices.len()
    }

    /// Delayed work not yet due: notice timeouts, redirects, replies.
    pub fn pending_timers(&self) -> usize {
        self.deferred.len()
    }

    /// Loads `page` as if the visitor opened it, following any immediate
    /// redirects.
    pub fn load(&mut self, page: Page) -> Vec<PageOutput> {
        let mut out = Vec::new();
        self.navigate(page, &mut out);
        out
    }

    /// Handles one visitor action. [`PageEvent::Shutdown`] is a no-op
    /// here; [`run`](Self::run) stops on it.
    pub fn handle_event(&mut self, event: PageEvent) -> Vec<PageOutput> {
        let mut out = Vec::new();
        self.dispatch(event, &mut out);
        out
    }

    /// Runs the page until [`PageEvent::Shutdown`] arrives, the event
    /// channel closes, or nobody listens to the outputs any more.
    ///
    /// Returns the portal so its final state can be inspected.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<PageEvent>,
        outputs: mpsc::UnboundedSender<PageOutput>,
    ) -> Self {
        tracing::info!(page = %self.page(), "portal running");

        loop {
            let mut out = Vec::new();

            tokio::select! {
                event = events.recv() => match event {
                    Some(PageEvent::Shutdown) | None => break,
                    Some(event) => self.dispatch(event, &mut out),
                },
                _ = self.expiry_ticker.wait_for_tick() => {
                    self.check_expiry(&mut out);
                }
                (card, tick) = self.card_tickers.next_due() => {
                    self.refresh_telemetry(card, tick, &mut out);
                }
                (_, job) = self.deferred.next_due() => {
                    self.run_deferred(job, &mut out);
                }
            }

            for output in out {
                if outputs.send(output).is_err() {
                    tracing::info!("page output closed, stopping portal");
                    return self;
                }
            }
        }

        tracing::info!(page = %self.page(), "portal stopped");
        self
    }
}
