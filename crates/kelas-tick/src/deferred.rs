//! One-shot delayed values.
//!
//! A [`DeferredQueue`] holds values that become due at some point in the
//! future. The runtime awaits [`DeferredQueue::next_due`] in its `select!`
//! loop and acts on each value as it comes out.
//!
//! Only two things remove a value before it is due: [`cancel`] (a notice
//! dismissed by hand) and [`clear`] (the page went away). Either way the
//! value is never delivered.
//!
//! [`cancel`]: DeferredQueue::cancel
//! [`clear`]: DeferredQueue::clear

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::trace;

/// Far enough ahead to mean "never" without overflowing `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Handle for a scheduled value, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeferredId(u64);

impl fmt::Display for DeferredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Values waiting for their deadline, earliest first.
///
/// Values with the same deadline come out in the order they were
/// scheduled.
pub struct DeferredQueue<T> {
    /// Ordered by deadline, then by id (i.e. insertion order).
    entries: BTreeMap<(Instant, DeferredId), T>,
    /// Reverse index so `cancel` doesn't scan.
    deadlines: HashMap<DeferredId, Instant>,
    next_id: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `value` to come due `after` from now.
    pub fn schedule(&mut self, after: Duration, value: T) -> DeferredId {
        let now = Instant::now();
        let deadline = now
            .checked_add(after)
            .unwrap_or_else(|| now + FAR_FUTURE);

        self.next_id += 1;
        let id = DeferredId(self.next_id);
        self.entries.insert((deadline, id), value);
        self.deadlines.insert(id, deadline);

        trace!(%id, after_ms = after.as_millis(), "deferred value scheduled");
        id
    }

    /// Removes a pending value. Returns it, or `None` if it already came
    /// due or was never scheduled.
    pub fn cancel(&mut self, id: DeferredId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        let value = self.entries.remove(&(deadline, id));
        trace!(%id, "deferred value cancelled");
        value
    }

    /// Drops every pending value. Returns how many there were.
    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.deadlines.clear();
        dropped
    }

    pub fn contains(&self, id: DeferredId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the earliest pending value comes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Waits for the earliest value to come due and removes it.
    ///
    /// Pends forever while the queue is empty. Cancel-safe: nothing is
    /// removed until the deadline has passed, and removal happens without
    /// another await.
    pub async fn next_due(&mut self) -> (DeferredId, T) {
        let Some(deadline) = self.next_deadline() else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        match self.entries.pop_first() {
            Some(((_, id), value)) => {
                self.deadlines.remove(&id);
                (id, value)
            }
            None => std::future::pending().await,
        }
    }
}
