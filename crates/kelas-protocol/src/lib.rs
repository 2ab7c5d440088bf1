//! Shared types for Kelas.
//!
//! This crate defines what the portal persists and what its pages are:
//!
//! - **Records** ([`UserRecord`], [`UserStats`], [`SessionExpiry`]): the
//!   values stored between page loads, under the names in [`keys`].
//! - **Page types** ([`Page`], [`Theme`], [`Notice`]): page identity,
//!   display mode, and transient messages.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how records become text.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Storage (strings) → Protocol (records) → Session (who is logged in)
//! ```

mod codec;
pub mod duration_ms;
mod error;
pub mod keys;
mod page;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use page::{CLASS_7F, DASHBOARD, INDEX, Notice, NoticeKind, PROFILE, Page, Theme};
pub use types::{
    DeviceInfo, ProfileStats, SessionExpiry, StatsEntry, UserId, UserRecord, UserStats,
};
