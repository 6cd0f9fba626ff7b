//! The Runtime: unified API for the Herald system.
//!
//! The Runtime brings together the durable guild set, entity snapshots,
//! presence reconciliation, permission resolution, and script execution
//! into one service object. It is constructed once at startup and passed
//! to the gateway and command layers; there is no global state.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::info;

use herald_core::{
    resolve_permissions, shard_index, BotUser, ChannelId, CoreError, Guild, GuildId, Permissions,
    UserId,
};
use herald_presence::{guild_counts, PresenceEvent, ReconcileReport, Reconciler};
use herald_script::{NullOutbound, Outbound, ScriptContext, ScriptContextBuilder};
use herald_store::{GuildSetStore, SnapshotStore, DEFAULT_SET_NAME};

use crate::error::{Result, RuntimeError};

/// Configuration for the Runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of gateway shards the guild space is partitioned across.
    pub num_shards: u32,
    /// Name of the durable guild set.
    pub set_name: String,
    /// Abort scripts after roughly this many Lua instructions; `None`
    /// leaves only the per-capability call caps in force.
    pub script_instruction_limit: Option<u32>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            num_shards: 1,
            set_name: DEFAULT_SET_NAME.to_string(),
            script_instruction_limit: Some(1_000_000),
        }
    }
}

/// The main Runtime struct.
///
/// Provides a unified API for:
/// - Loading and reconciling the durable guild set
/// - Handling gateway guild lifecycle notifications
/// - Resolving member permissions from snapshots
/// - Building script contexts for command invocations
pub struct Runtime<G: GuildSetStore, S: SnapshotStore> {
    /// The bot identity this runtime operates as.
    bot: BotUser,
    /// Entity snapshots (guilds with their roles, channels, members).
    snapshots: Arc<S>,
    /// Reconciler over the durable guild set.
    reconciler: Reconciler<G>,
    /// Removal events produced by the reconciler, until taken.
    events: Mutex<Option<mpsc::UnboundedReceiver<PresenceEvent>>>,
    /// Outbound delivery collaborator handed to script contexts.
    outbound: Arc<dyn Outbound>,
    /// Configuration.
    config: RuntimeConfig,
}

impl<G: GuildSetStore, S: SnapshotStore> Runtime<G, S> {
    /// Create a new runtime instance.
    pub fn new(bot: BotUser, guild_set: G, snapshots: S, config: RuntimeConfig) -> Self {
        let (reconciler, rx) = Reconciler::new(Arc::new(guild_set));
        Self {
            bot,
            snapshots: Arc::new(snapshots),
            reconciler,
            events: Mutex::new(Some(rx)),
            outbound: Arc::new(NullOutbound),
            config,
        }
    }

    /// Replace the outbound collaborator handed to script contexts.
    pub fn with_outbound(mut self, outbound: Arc<dyn Outbound>) -> Self {
        self.outbound = outbound;
        self
    }

    /// Get the bot identity.
    pub fn bot(&self) -> &BotUser {
        &self.bot
    }

    /// Get the snapshot store reference.
    pub fn snapshots(&self) -> &S {
        &self.snapshots
    }

    /// Take the receiver for guild-removal events.
    ///
    /// Yields `Some` exactly once; the caller owns downstream handling
    /// (cleanup of per-guild state, metrics, and so on).
    pub fn events(&self) -> Option<mpsc::UnboundedReceiver<PresenceEvent>> {
        self.events.lock().ok().and_then(|mut slot| slot.take())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Presence Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the durable guild set at startup.
    pub async fn load_connected_guilds(&self) -> Result<Vec<GuildId>> {
        Ok(self.reconciler.load().await?)
    }

    /// Reconcile one shard's partition of the durable set against the
    /// guild list it reported at ready time.
    pub async fn handle_shard_ready(
        &self,
        shard: u32,
        live: &HashSet<GuildId>,
    ) -> Result<ReconcileReport> {
        let report = self
            .reconciler
            .reconcile(shard, self.config.num_shards, live)
            .await?;
        info!(
            shard,
            checked = report.checked,
            removed = report.removed.len(),
            "shard ready reconciled"
        );
        Ok(report)
    }

    /// Record a live guild-create notification and store its snapshot.
    pub async fn handle_guild_create(&self, guild: Guild) -> Result<()> {
        self.reconciler.add_guild(guild.id).await?;
        self.snapshots.put_guild(guild).await?;
        Ok(())
    }

    /// Record a live guild-delete notification and drop its snapshot.
    pub async fn handle_guild_delete(&self, id: GuildId) -> Result<()> {
        self.reconciler.remove_guild(id).await?;
        self.snapshots.remove_guild(id).await?;
        Ok(())
    }

    /// The shard a guild is assigned to under the configured shard count.
    pub fn guild_shard(&self, id: GuildId) -> Result<u32> {
        Ok(shard_index(id, self.config.num_shards)?)
    }

    /// Per-shard guild counts over the snapshot store.
    pub async fn guild_counts(&self) -> Result<Vec<usize>> {
        Ok(guild_counts(self.snapshots.as_ref(), self.config.num_shards).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a member's effective permissions in a channel.
    pub async fn member_permissions(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<Permissions> {
        let guild = self.guild(guild_id).await?;
        Ok(resolve_permissions(&guild, channel_id, user_id)?)
    }

    /// Command-authorization check: true if the member's resolved mask
    /// contains any of `needed`, manage-guild, or administrator.
    pub async fn admin_or_permission(
        &self,
        needed: Permissions,
        guild_id: GuildId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<bool> {
        let perms = self
            .member_permissions(guild_id, channel_id, user_id)
            .await?;
        Ok(perms.intersects(needed)
            || perms.contains(Permissions::MANAGE_GUILD)
            || perms.contains(Permissions::ADMINISTRATOR))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Script Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a single-use script context for a command invocation.
    ///
    /// The returned context carries the guild, channel, and member
    /// snapshots plus the default capability set; render it once with the
    /// command's script source.
    pub async fn script_context(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<ScriptContext> {
        let guild = self.guild(guild_id).await?;
        let channel = guild
            .channel(channel_id)
            .ok_or(CoreError::ChannelNotFound(channel_id))?
            .clone();
        let member = guild
            .member(user_id)
            .ok_or(CoreError::MemberNotFound(user_id))?
            .clone();

        let mut builder = ScriptContextBuilder::new(self.bot.clone(), guild, channel, member)
            .outbound(Arc::clone(&self.outbound));
        if let Some(limit) = self.config.script_instruction_limit {
            builder = builder.instruction_limit(limit);
        }
        Ok(builder.build()?)
    }

    async fn guild(&self, id: GuildId) -> Result<Guild> {
        self.snapshots
            .guild(id)
            .await?
            .ok_or(RuntimeError::Core(CoreError::GuildNotFound(id)))
    }
}
