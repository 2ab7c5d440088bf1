//! What the portal does with each event, tick and due timer.
//!
//! Every handler appends to an output buffer instead of sending directly,
//! so [`Portal::load`] and [`Portal::handle_event`] can hand the buffer
//! back to a test while [`Portal::run`] forwards it to the page.
//!
//! Guard [`Effect`]s are carried out here:
//!   - `Notify` posts a notice and schedules its removal
//!   - `Navigate` with no delay unloads the page and loads the target
//!   - `Navigate` with a delay, and `Schedule`, go into the deferred queue

use kelas_protocol::{Notice, Page};
use kelas_session::{Authenticator, Clock, Effect, GuardTask, SessionError, SessionState};
use chrono::{DateTime, Local};
use kelas_tick::TickInfo;
use kelas_widgets::{
    BatterySimulator, ChatMessage, Sender, Telemetry, TelemetryCard, TelemetryUpdate, respond,
};
use tokio::time::Instant;

use crate::runtime::{MAX_REDIRECT_HOPS, NoticeId, PageEvent, PageOutput, Portal};

/// Work waiting in the portal's deferred queue.
#[derive(Debug)]
pub(crate) enum Deferred {
    /// Second half of a login or logout.
    Guard(GuardTask),
    /// Delayed redirect.
    Navigate(Page),
    /// Notice timeout.
    DismissNotice(NoticeId),
    /// The assistant's answer, held back to look like typing.
    Reply(String),
}

impl<A: Authenticator> Portal<A> {
    // -- visitor events ----------------------------------------------------

    pub(crate) fn dispatch(&mut self, event: PageEvent, out: &mut Vec<PageOutput>) {
        match event {
            PageEvent::Activity => {
                self.guard.touch();
            }
            PageEvent::Login(credentials) => match self.guard.login(credentials) {
                Ok(effects) => self.apply(effects, out),
                Err(SessionError::Validation(message)) => {
                    out.push(PageOutput::LoginRejected(message));
                }
                Err(e) => out.push(PageOutput::LoginRejected(e.to_string())),
            },
            PageEvent::Logout { confirmed } => {
                let effects = self.guard.logout(confirmed);
                self.apply(effects, out);
            }
            PageEvent::Chat(message) => {
                let message = message.trim();
                if let Some(reply) = respond(message, self.battery_text.as_deref()) {
                    let sent = ChatMessage::new(Sender::User, message, &self.local_now());
                    out.push(PageOutput::ChatSent(sent));
                    self.deferred
                        .schedule(self.config.chat_reply_delay, Deferred::Reply(reply));
                }
            }
            PageEvent::ToggleTheme => match self.theme.toggle() {
                Ok(theme) => out.push(PageOutput::Theme(theme)),
                Err(e) => tracing::warn!(error = %e, "theme not saved"),
            },
            PageEvent::Dismiss(id) => {
                if let Some(timer) = self.notices.remove(&id) {
                    self.deferred.cancel(timer);
                    out.push(PageOutput::NoticeDismissed(id));
                }
            }
            PageEvent::Visit(page) => self.navigate(page, out),
            PageEvent::Shutdown => {}
        }
    }

    // -- timers ------------------------------------------------------------

    pub(crate) fn check_expiry(&mut self, out: &mut Vec<PageOutput>) {
        tracing::trace!(page = %self.guard.page(), "expiry check");
        let effects = self.guard.check_expiry();
        self.apply(effects, out);
    }

    /// Refreshes one card group. Only logged-in pages show the cards.
    pub(crate) fn refresh_telemetry(
        &mut self,
        card: TelemetryCard,
        tick: TickInfo,
        out: &mut Vec<PageOutput>,
    ) {
        if tick.overrun {
            tracing::debug!(
                ?card,
                tick = tick.tick,
                skipped = tick.ticks_skipped,
                "telemetry late"
            );
        }
        if self.guard.state() != SessionState::Active {
            return;
        }

        let update = match card {
            TelemetryCard::Clock => {
                let now = self.local_now();
                self.telemetry.clock(&now, self.loaded_at.elapsed())
            }
            TelemetryCard::Battery => self.telemetry.battery_step(&mut rand::rng()),
            TelemetryCard::Stats => self.telemetry.stats(&mut rand::rng()),
            TelemetryCard::Network => self.telemetry.network(&mut rand::rng()),
        };
        if let TelemetryUpdate::Battery(reading) = &update {
            self.battery_text = Some(reading.percent_text());
        }
        out.push(PageOutput::Telemetry(update));
    }

    /// Wall clock in the host's time zone, as the page displays it.
    fn local_now(&self) -> DateTime<Local> {
        self.guard.clock().now().with_timezone(&Local)
    }

    pub(crate) fn run_deferred(&mut self, job: Deferred, out: &mut Vec<PageOutput>) {
        match job {
            Deferred::Guard(task) => {
                let effects = self.guard.run_task(task);
                self.apply(effects, out);
            }
            Deferred::Navigate(page) => self.navigate(page, out),
            Deferred::DismissNotice(id) => {
                if self.notices.remove(&id).is_some() {
                    out.push(PageOutput::NoticeDismissed(id));
                }
            }
            Deferred::Reply(text) => {
                let now = self.local_now();
                out.push(PageOutput::ChatReply(ChatMessage::new(Sender::Bot, text, &now)));
            }
        }
    }

    // -- effects -----------------------------------------------------------

    /// Carries out guard effects in order. An immediate navigation ends
    /// the page, so anything after it is dropped.
    pub(crate) fn apply(&mut self, effects: Vec<Effect>, out: &mut Vec<PageOutput>) {
        if let Some(target) = self.apply_on_page(effects, out) {
            self.navigate(target, out);
        }
    }

    /// Like [`apply`](Self::apply), but hands an immediate navigation back
    /// to the caller instead of following it.
    fn apply_on_page(&mut self, effects: Vec<Effect>, out: &mut Vec<PageOutput>) -> Option<Page> {
        for effect in effects {
            match effect {
                Effect::ShowIdentity(user) => {
                    self.telemetry =
                        Telemetry::new(BatterySimulator::seeded(Some(user.battery_level)));
                    out.push(PageOutput::Identity(user));
                }
                Effect::Notify(notice) => out.push(self.post_notice(notice)),
                Effect::Navigate { to, after } if after.is_zero() => return Some(to),
                Effect::Navigate { to, after } => {
                    self.deferred.schedule(after, Deferred::Navigate(to));
                }
                Effect::Schedule { after, task } => {
                    self.deferred.schedule(after, Deferred::Guard(task));
                }
            }
        }
        None
    }

    fn post_notice(&mut self, notice: Notice) -> PageOutput {
        self.next_notice += 1;
        let id = NoticeId(self.next_notice);
        let timer = self
            .deferred
            .schedule(self.config.notice_duration, Deferred::DismissNotice(id));
        self.notices.insert(id, timer);
        tracing::debug!(%id, kind = ?notice.kind, "notice posted");
        PageOutput::Notice { id, notice }
    }

    // -- navigation --------------------------------------------------------

    /// Loads `to`, then whatever it redirects to, up to
    /// [`MAX_REDIRECT_HOPS`] pages.
    pub(crate) fn navigate(&mut self, to: Page, out: &mut Vec<PageOutput>) {
        let mut next = Some(to);
        let mut hops = 0;

        while let Some(page) = next.take() {
            if hops == MAX_REDIRECT_HOPS {
                tracing::warn!(%page, hops, "redirect loop, staying on current page");
                break;
            }
            hops += 1;
            next = self.visit(page, out);
        }
    }

    /// One page load: drop everything the old page had running, then
    /// restore the session and check the route. Routing is skipped only
    /// when restoring already leaves the page at once.
    fn visit(&mut self, page: Page, out: &mut Vec<PageOutput>) -> Option<Page> {
        let dropped = self.deferred.clear();
        self.notices.clear();
        self.telemetry = Telemetry::default();
        self.battery_text = None;
        self.expiry_ticker.reset();
        self.card_tickers.reset();
        self.loaded_at = Instant::now();

        self.guard.set_page(page.clone());
        tracing::info!(%page, dropped, "page loaded");

        out.push(PageOutput::Navigated(page));
        out.push(PageOutput::Theme(self.theme.theme()));

        let mut effects = self.guard.restore();
        let leaving = effects
            .iter()
            .any(|effect| matches!(effect, Effect::Navigate { after, .. } if after.is_zero()));
        if !leaving {
            effects.extend(self.guard.enforce_routing());
        }
        self.apply_on_page(effects, out)
    }
}
