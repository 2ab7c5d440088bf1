//! Timers for the Kelas portal runtime.
//!
//! Two kinds of time-driven work happen on a portal page:
//!
//! - **Intervals**: the once-a-minute expiry check and the telemetry
//!   refresh. These are [`Ticker`]s.
//! - **One-shots**: "show this notice for five seconds", "navigate after
//!   1.5 s", "finish the login after 2 s". These go in a
//!   [`DeferredQueue`].
//!
//! # Disabled mode
//!
//! A ticker with a zero period never fires: [`Ticker::wait_for_tick`]
//! pends forever. An empty [`DeferredQueue`] behaves the same way. Both
//! are meant to sit inside a `tokio::select!` loop, where a branch that
//! never completes is simply never chosen:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* handle page events */ }
//!         _ = expiry.wait_for_tick() => { /* check the session */ }
//!         (_, task) = deferred.next_due() => { /* run the delayed task */ }
//!     }
//! }
//! ```

mod deferred;
mod error;
mod ticker;

pub use deferred::{DeferredId, DeferredQueue};
pub use error::TickError;
pub use ticker::{TickInfo, TickMetrics, TickPolicy, Ticker, TickerConfig};
