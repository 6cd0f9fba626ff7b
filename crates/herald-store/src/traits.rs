//! Store traits: the abstract interfaces the runtime persists through.
//!
//! These traits keep the runtime storage-agnostic. Implementations include
//! SQLite (primary, durable guild set) and in-memory (tests and the entity
//! snapshot stand-in).

use async_trait::async_trait;
use herald_core::{Guild, GuildId};

use crate::error::Result;

/// The durable set of guild ids this process believes it is connected to.
///
/// Keyed by one fixed set name chosen at store construction. After a
/// complete reconciliation pass the set equals exactly the union of guild
/// ids visible across all live shards.
///
/// # Design Notes
///
/// - **Per-entry atomicity**: `add` and `remove` are atomic single-entry
///   operations. Concurrent reconciliation passes touch disjoint partitions
///   of the set, so no global lock is needed.
/// - **Idempotence**: adding a present id or removing an absent one is not
///   an error; `remove` reports whether an entry was actually deleted.
#[async_trait]
pub trait GuildSetStore: Send + Sync {
    /// Add a guild id to the durable set.
    async fn add(&self, id: GuildId) -> Result<()>;

    /// Remove a guild id from the durable set.
    ///
    /// Returns `true` if the id was present.
    async fn remove(&self, id: GuildId) -> Result<bool>;

    /// Whether the durable set contains the id.
    async fn contains(&self, id: GuildId) -> Result<bool>;

    /// List every guild id in the durable set.
    async fn list(&self) -> Result<Vec<GuildId>>;
}

/// On-demand access to guild entity snapshots.
///
/// Stands in for the external entity cache: resolves a full guild snapshot
/// by id, and enumerates known guilds for per-shard count reporting.
/// Absence is `None`; callers that require presence convert it to their
/// own `NotFound`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Resolve a guild snapshot by id.
    async fn guild(&self, id: GuildId) -> Result<Option<Guild>>;

    /// Insert or replace a guild snapshot.
    async fn put_guild(&self, guild: Guild) -> Result<()>;

    /// Remove a guild snapshot. Returns `true` if one was present.
    async fn remove_guild(&self, id: GuildId) -> Result<bool>;

    /// Ids of every guild with a stored snapshot.
    async fn guild_ids(&self) -> Result<Vec<GuildId>>;
}
