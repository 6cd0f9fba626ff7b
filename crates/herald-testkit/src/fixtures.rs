//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use rand::Rng;

use herald_core::{
    shard_index, Channel, ChannelId, Guild, GuildId, Member, Overwrite, Permissions, Role, RoleId,
    UserId,
};
use herald_store::{GuildSetStore, MemoryStore, SnapshotStore};

/// Builds guild snapshots for tests.
///
/// The everyone role is always present; everything else is opt-in.
pub struct GuildFixture {
    guild: Guild,
}

impl GuildFixture {
    /// Start a guild with its everyone role and no other entities.
    pub fn new(id: GuildId, owner: UserId) -> Self {
        let guild = Guild {
            id,
            name: format!("guild-{}", id.get()),
            owner_id: owner,
            roles: vec![Role {
                id: id.everyone_role(),
                name: "@everyone".into(),
                permissions: Permissions::empty(),
            }],
            channels: vec![],
            members: vec![],
        };
        Self { guild }
    }

    /// Set the guild's display name.
    pub fn name(mut self, name: &str) -> Self {
        self.guild.name = name.to_string();
        self
    }

    /// Set the base permissions carried by the everyone role.
    pub fn everyone_permissions(mut self, perms: Permissions) -> Self {
        self.guild.roles[0].permissions = perms;
        self
    }

    /// Add a role.
    pub fn role(mut self, id: u64, name: &str, perms: Permissions) -> Self {
        self.guild.roles.push(Role {
            id: RoleId::new(id),
            name: name.to_string(),
            permissions: perms,
        });
        self
    }

    /// Add a channel without overwrites.
    pub fn channel(self, id: u64, name: &str) -> Self {
        self.channel_with_overwrites(id, name, vec![])
    }

    /// Add a channel with permission overwrites.
    pub fn channel_with_overwrites(
        mut self,
        id: u64,
        name: &str,
        overwrites: Vec<Overwrite>,
    ) -> Self {
        self.guild.channels.push(Channel {
            id: ChannelId::new(id),
            name: name.to_string(),
            overwrites,
        });
        self
    }

    /// Add a member holding the given roles.
    pub fn member(mut self, id: u64, username: &str, roles: &[u64]) -> Self {
        self.guild.members.push(Member {
            user_id: UserId::new(id),
            username: username.to_string(),
            roles: roles.iter().copied().map(RoleId::new).collect(),
        });
        self
    }

    /// Finish and return the snapshot.
    pub fn build(self) -> Guild {
        self.guild
    }
}

/// A synthetic snowflake guaranteed to land on `shard` out of `num_shards`.
///
/// Distinct `n` values produce distinct ids on the same shard.
pub fn snowflake_on_shard(shard: u32, num_shards: u32, n: u64) -> GuildId {
    assert!(num_shards > 0 && shard < num_shards);
    let id = GuildId::new(((n * num_shards as u64 + shard as u64) << 22) | 1);
    debug_assert_eq!(shard_index(id, num_shards).unwrap(), shard);
    id
}

/// A random plausible snowflake (timestamp bits populated).
pub fn random_snowflake() -> GuildId {
    let mut rng = rand::thread_rng();
    GuildId::new(rng.gen_range(1u64 << 22..1u64 << 60))
}

/// A memory store whose durable guild set holds the given ids.
pub async fn seeded_guild_set(ids: &[GuildId]) -> MemoryStore {
    let store = MemoryStore::new();
    for id in ids {
        store.add(*id).await.expect("memory add never fails");
    }
    store
}

/// A memory store holding the given snapshots.
pub async fn seeded_snapshots(guilds: Vec<Guild>) -> MemoryStore {
    let store = MemoryStore::new();
    for guild in guilds {
        store.put_guild(guild).await.expect("memory put never fails");
    }
    store
}
