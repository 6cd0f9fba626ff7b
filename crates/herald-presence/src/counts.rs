//! Per-shard guild counts for status and load reporting.

use herald_core::shard_index;
use herald_store::SnapshotStore;

use crate::error::Result;

/// Count the guilds owned by each shard.
///
/// Iterates the entity snapshot store and applies the shard assigner; the
/// result is consumed by the sharding collaborator for status reporting.
pub async fn guild_counts<S: SnapshotStore>(snapshot: &S, num_shards: u32) -> Result<Vec<usize>> {
    let mut counts = vec![0usize; num_shards as usize];

    for id in snapshot.guild_ids().await? {
        let shard = shard_index(id, num_shards)?;
        counts[shard as usize] += 1;
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{Guild, GuildId, UserId};
    use herald_store::MemoryStore;

    fn empty_guild(raw: u64) -> Guild {
        Guild {
            id: GuildId::new(raw),
            name: String::new(),
            owner_id: UserId::new(1),
            roles: vec![],
            channels: vec![],
            members: vec![],
        }
    }

    #[tokio::test]
    async fn test_counts_follow_assignment() {
        let store = MemoryStore::new();
        // Two guilds on shard 0, one on shard 1 (of 2).
        for raw in [(2u64) << 22, (4u64) << 22, (3u64) << 22] {
            store.put_guild(empty_guild(raw)).await.unwrap();
        }

        let counts = guild_counts(&store, 2).await.unwrap();
        assert_eq!(counts, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_zero_shards_errors() {
        let store = MemoryStore::new();
        store.put_guild(empty_guild(1)).await.unwrap();
        assert!(guild_counts(&store, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_store_yields_zeroes() {
        let store = MemoryStore::new();
        assert_eq!(guild_counts(&store, 3).await.unwrap(), vec![0, 0, 0]);
    }
}
