//! Guild entity snapshots.
//!
//! These types mirror what the entity snapshot collaborator hands the core:
//! immutable, caller-owned views of a guild and its roles, channels, and
//! members. Roles and channels are owned by the guild; nothing here
//! outlives the snapshot it came from.

use serde::{Deserialize, Serialize};

use crate::perms::Permissions;
use crate::types::{ChannelId, GuildId, RoleId, UserId};

/// A community container: channels, roles, and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub owner_id: UserId,
    pub roles: Vec<Role>,
    pub channels: Vec<Channel>,
    pub members: Vec<Member>,
}

impl Guild {
    /// Look up a channel by id.
    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Look up a role by id.
    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Look up a role by name. Case-sensitive.
    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// The implicit everyone role. Shares its id with the guild and is
    /// expected to always exist in a well-formed snapshot.
    pub fn everyone_role(&self) -> Option<&Role> {
        self.role(self.id.everyone_role())
    }

    /// Look up a member by user id.
    pub fn member(&self, user_id: UserId) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }
}

/// A named permission-bearing group assignable to members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Permissions,
}

/// A channel within a guild, carrying its permission overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub overwrites: Vec<Overwrite>,
}

/// Target kind of a channel permission overwrite.
///
/// Unknown kinds deserialize to [`OverwriteKind::Unknown`] and are skipped
/// by the resolver, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteKind {
    Role,
    Member,
    #[serde(other)]
    Unknown,
}

/// A channel-scoped allow/deny override targeting a role or a member.
///
/// The target id is kept raw: it names a role for `kind = Role` and a user
/// for `kind = Member`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overwrite {
    pub kind: OverwriteKind,
    pub target: u64,
    pub allow: Permissions,
    pub deny: Permissions,
}

/// A guild member and the roles they hold.
///
/// The role list has set semantics; duplicate entries are harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub username: String,
    pub roles: Vec<RoleId>,
}

impl Member {
    /// Membership test against the member's role list.
    pub fn has_role(&self, id: RoleId) -> bool {
        self.roles.contains(&id)
    }
}

/// The bot's own identity, bound into script contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotUser {
    pub id: UserId,
    pub username: String,
}

/// The message that triggered a command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: String,
}

impl Message {
    /// Construct a synthetic message authored by the bot, used when a
    /// script context is created outside a real command invocation.
    pub fn synthetic(bot: &BotUser, channel_id: ChannelId) -> Self {
        Self {
            id: 0,
            channel_id,
            author_id: bot.id,
            content: String::new(),
        }
    }
}
