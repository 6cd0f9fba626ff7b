//! # Herald Presence
//!
//! Keeps the durable guild set consistent with what each shard actually
//! observes, and surfaces guilds that were left while the process was
//! offline.
//!
//! Each shard reconciles only its own deterministic partition of the set
//! (see [`herald_core::shard_index`]), so concurrent per-shard passes never
//! contend on the same entry.
//!
//! ## Key Types
//!
//! - [`Reconciler`] - compares the durable set against live shard views
//! - [`PresenceEvent`] - synthetic removal notifications for downstream handling
//! - [`guild_counts`] - per-shard guild counts for status reporting

pub mod counts;
pub mod error;
pub mod events;
pub mod reconciler;

pub use counts::guild_counts;
pub use error::{PresenceError, Result};
pub use events::PresenceEvent;
pub use reconciler::{ReconcileReport, Reconciler};
