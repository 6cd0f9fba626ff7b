//! In-memory implementation of the store traits.
//!
//! Primarily for testing, and as the entity-cache stand-in. Same semantics
//! as SQLite for the guild set, but nothing survives a drop.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use herald_core::{Guild, GuildId};

use crate::error::{Result, StoreError};
use crate::traits::{GuildSetStore, SnapshotStore};

/// In-memory store implementing both [`GuildSetStore`] and [`SnapshotStore`].
///
/// Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// The durable guild set.
    guild_set: BTreeSet<GuildId>,

    /// Guild snapshots indexed by id.
    snapshots: HashMap<GuildId, Guild>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                guild_set: BTreeSet::new(),
                snapshots: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GuildSetStore for MemoryStore {
    async fn add(&self, id: GuildId) -> Result<()> {
        self.write()?.guild_set.insert(id);
        Ok(())
    }

    async fn remove(&self, id: GuildId) -> Result<bool> {
        Ok(self.write()?.guild_set.remove(&id))
    }

    async fn contains(&self, id: GuildId) -> Result<bool> {
        Ok(self.read()?.guild_set.contains(&id))
    }

    async fn list(&self) -> Result<Vec<GuildId>> {
        Ok(self.read()?.guild_set.iter().copied().collect())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn guild(&self, id: GuildId) -> Result<Option<Guild>> {
        Ok(self.read()?.snapshots.get(&id).cloned())
    }

    async fn put_guild(&self, guild: Guild) -> Result<()> {
        self.write()?.snapshots.insert(guild.id, guild);
        Ok(())
    }

    async fn remove_guild(&self, id: GuildId) -> Result<bool> {
        Ok(self.write()?.snapshots.remove(&id).is_some())
    }

    async fn guild_ids(&self) -> Result<Vec<GuildId>> {
        Ok(self.read()?.snapshots.keys().copied().collect())
    }
}
