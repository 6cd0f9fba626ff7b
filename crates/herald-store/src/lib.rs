//! # Herald Store
//!
//! Storage abstraction for the Herald runtime. Two concerns live here:
//!
//! - The **durable guild set**: the set of guild ids the process believes
//!   it is connected to, surviving restarts. This is the source of truth
//!   the presence reconciler compares against live shard views.
//! - The **entity snapshot store**: resolves guild snapshots by id on
//!   demand, standing in for the external entity cache.
//!
//! Both are traits so the runtime stays storage-agnostic. The primary
//! guild-set backend is [`SqliteStore`]; [`MemoryStore`] implements both
//! traits for tests and as an entity-cache stand-in.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{GuildSetStore, SnapshotStore};

/// Default name of the durable guild set.
pub const DEFAULT_SET_NAME: &str = "connected_guilds";
