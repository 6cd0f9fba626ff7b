//! Permission bitmask and the effective-permission resolver.
//!
//! Permissions map directly onto a fixed-width unsigned integer; the
//! resolver is pure and stateless over caller-supplied snapshots, so it
//! needs no locking and can run concurrently.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::{Guild, OverwriteKind};
use crate::types::{ChannelId, UserId};

/// A permission bitmask.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const CREATE_INSTANT_INVITE: Self = Self(1 << 0);
    pub const KICK_MEMBERS: Self = Self(1 << 1);
    pub const BAN_MEMBERS: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_CHANNELS: Self = Self(1 << 4);
    pub const MANAGE_GUILD: Self = Self(1 << 5);
    pub const ADD_REACTIONS: Self = Self(1 << 6);
    pub const VIEW_CHANNEL: Self = Self(1 << 10);
    pub const SEND_MESSAGES: Self = Self(1 << 11);
    pub const SEND_TTS_MESSAGES: Self = Self(1 << 12);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const EMBED_LINKS: Self = Self(1 << 14);
    pub const ATTACH_FILES: Self = Self(1 << 15);
    pub const READ_MESSAGE_HISTORY: Self = Self(1 << 16);
    pub const MENTION_EVERYONE: Self = Self(1 << 17);
    pub const CONNECT: Self = Self(1 << 20);
    pub const SPEAK: Self = Self(1 << 21);
    pub const MUTE_MEMBERS: Self = Self(1 << 22);
    pub const DEAFEN_MEMBERS: Self = Self(1 << 23);
    pub const MOVE_MEMBERS: Self = Self(1 << 24);
    pub const USE_VAD: Self = Self(1 << 25);
    pub const CHANGE_NICKNAME: Self = Self(1 << 26);
    pub const MANAGE_NICKNAMES: Self = Self(1 << 27);
    pub const MANAGE_ROLES: Self = Self(1 << 28);
    pub const MANAGE_WEBHOOKS: Self = Self(1 << 29);
    pub const MANAGE_EMOJIS: Self = Self(1 << 30);

    /// All text-channel permissions.
    pub const ALL_TEXT: Self = Self(
        Self::VIEW_CHANNEL.0
            | Self::SEND_MESSAGES.0
            | Self::SEND_TTS_MESSAGES.0
            | Self::MANAGE_MESSAGES.0
            | Self::EMBED_LINKS.0
            | Self::ATTACH_FILES.0
            | Self::READ_MESSAGE_HISTORY.0
            | Self::MENTION_EVERYONE.0
            | Self::ADD_REACTIONS.0,
    );

    /// All voice-channel permissions.
    pub const ALL_VOICE: Self = Self(
        Self::CONNECT.0
            | Self::SPEAK.0
            | Self::MUTE_MEMBERS.0
            | Self::DEAFEN_MEMBERS.0
            | Self::MOVE_MEMBERS.0
            | Self::USE_VAD.0,
    );

    /// Every channel-scoped permission.
    pub const ALL_CHANNEL: Self = Self(
        Self::ALL_TEXT.0
            | Self::ALL_VOICE.0
            | Self::CREATE_INSTANT_INVITE.0
            | Self::MANAGE_CHANNELS.0
            | Self::MANAGE_ROLES.0
            | Self::MANAGE_WEBHOOKS.0,
    );

    /// The full permission bitmask.
    pub const ALL: Self = Self(
        Self::ALL_CHANNEL.0
            | Self::KICK_MEMBERS.0
            | Self::BAN_MEMBERS.0
            | Self::MANAGE_GUILD.0
            | Self::ADMINISTRATOR.0
            | Self::CHANGE_NICKNAME.0
            | Self::MANAGE_NICKNAMES.0
            | Self::MANAGE_EMOJIS.0,
    );

    /// The empty bitmask.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// A bitmask from its raw wire value. Undefined bits are kept as-is;
    /// resolution only ever reads the bits it knows about.
    pub const fn from_bits(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw bitmask value.
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set in `self`.
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for Permissions {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Permissions {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Permissions {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({:#x})", self.0)
    }
}

/// Compute the effective permission bitmask for a member in a channel.
///
/// The step order below is the contract, not an implementation detail:
///
/// 1. Locate the channel; absent channel is an error.
/// 2. The guild owner gets [`Permissions::ALL`] unconditionally.
/// 3. Resolve the member; absent member is an error.
/// 4. Seed with the everyone role, OR in every role the member holds.
/// 5. Administrator bypasses all channel overwrites.
/// 6. Apply the channel's everyone overwrite (deny, then allow).
/// 7. Collect allow/deny totals across all role overwrites the member
///    matches in a single pass, then apply deny and allow once. Applying
///    per-role sequentially would let one role's deny clobber another
///    role's allow depending on iteration order.
/// 8. The member-specific overwrite has final precedence.
///
/// Malformed overwrite data (unknown kind) is skipped, never an error.
pub fn resolve_permissions(
    guild: &Guild,
    channel_id: ChannelId,
    member_id: UserId,
) -> Result<Permissions> {
    let channel = guild
        .channel(channel_id)
        .ok_or(CoreError::ChannelNotFound(channel_id))?;

    if member_id == guild.owner_id {
        return Ok(Permissions::ALL);
    }

    let member = guild
        .member(member_id)
        .ok_or(CoreError::MemberNotFound(member_id))?;

    let everyone = guild.id.everyone_role();
    let mut perms = Permissions::empty();

    if let Some(role) = guild.role(everyone) {
        perms |= role.permissions;
    }

    for role_id in &member.roles {
        if let Some(role) = guild.role(*role_id) {
            perms |= role.permissions;
        }
    }

    // Administrator bypasses channel overwrites
    if perms.contains(Permissions::ADMINISTRATOR) {
        return Ok(perms | Permissions::ALL);
    }

    if let Some(ow) = channel
        .overwrites
        .iter()
        .find(|ow| ow.kind == OverwriteKind::Role && ow.target == everyone.get())
    {
        perms.remove(ow.deny);
        perms.insert(ow.allow);
    }

    // Member overwrites can override role overwrites, so collect the role
    // totals first and apply them in one step.
    let mut allows = Permissions::empty();
    let mut denies = Permissions::empty();

    for ow in &channel.overwrites {
        if ow.kind != OverwriteKind::Role || ow.target == everyone.get() {
            continue;
        }
        if member.has_role(crate::types::RoleId::new(ow.target)) {
            allows |= ow.allow;
            denies |= ow.deny;
        }
    }

    perms.remove(denies);
    perms.insert(allows);

    if let Some(ow) = channel
        .overwrites
        .iter()
        .find(|ow| ow.kind == OverwriteKind::Member && ow.target == member_id.get())
    {
        perms.remove(ow.deny);
        perms.insert(ow.allow);
    }

    if perms.contains(Permissions::ADMINISTRATOR) {
        perms |= Permissions::ALL_CHANNEL;
    }

    Ok(perms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Channel, Member, Overwrite, Role};
    use crate::types::{GuildId, RoleId};

    const GUILD: u64 = 1000;
    const CHANNEL: u64 = 2000;
    const OWNER: u64 = 1;
    const ALICE: u64 = 2;
    const MOD_ROLE: u64 = 3000;
    const GUEST_ROLE: u64 = 3001;

    fn guild(channel_overwrites: Vec<Overwrite>, alice_roles: Vec<u64>) -> Guild {
        Guild {
            id: GuildId::new(GUILD),
            name: "g".into(),
            owner_id: UserId::new(OWNER),
            roles: vec![
                Role {
                    id: RoleId::new(GUILD),
                    name: "@everyone".into(),
                    permissions: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
                },
                Role {
                    id: RoleId::new(MOD_ROLE),
                    name: "Mods".into(),
                    permissions: Permissions::KICK_MEMBERS,
                },
                Role {
                    id: RoleId::new(GUEST_ROLE),
                    name: "Guests".into(),
                    permissions: Permissions::empty(),
                },
            ],
            channels: vec![Channel {
                id: ChannelId::new(CHANNEL),
                name: "general".into(),
                overwrites: channel_overwrites,
            }],
            members: vec![Member {
                user_id: UserId::new(ALICE),
                username: "alice".into(),
                roles: alice_roles.into_iter().map(RoleId::new).collect(),
            }],
        }
    }

    #[test]
    fn test_channel_not_found() {
        let g = guild(vec![], vec![]);
        let err = resolve_permissions(&g, ChannelId::new(9), UserId::new(ALICE)).unwrap_err();
        assert_eq!(err, CoreError::ChannelNotFound(ChannelId::new(9)));
    }

    #[test]
    fn test_member_not_found() {
        let g = guild(vec![], vec![]);
        let err = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(42)).unwrap_err();
        assert_eq!(err, CoreError::MemberNotFound(UserId::new(42)));
    }

    #[test]
    fn test_owner_gets_all() {
        // Owner wins even through a deny-everything overwrite.
        let g = guild(
            vec![Overwrite {
                kind: OverwriteKind::Member,
                target: OWNER,
                allow: Permissions::empty(),
                deny: Permissions::ALL,
            }],
            vec![],
        );
        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(OWNER)).unwrap();
        assert_eq!(perms, Permissions::ALL);
    }

    #[test]
    fn test_everyone_seed_plus_member_roles() {
        let g = guild(vec![], vec![MOD_ROLE]);
        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert!(perms.contains(Permissions::SEND_MESSAGES));
        assert!(perms.contains(Permissions::KICK_MEMBERS));
        assert!(!perms.contains(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_administrator_ignores_deny_overwrites() {
        let mut g = guild(
            vec![Overwrite {
                kind: OverwriteKind::Role,
                target: MOD_ROLE,
                allow: Permissions::empty(),
                deny: Permissions::SEND_MESSAGES,
            }],
            vec![MOD_ROLE],
        );
        g.roles[1].permissions |= Permissions::ADMINISTRATOR;

        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert!(perms.contains(Permissions::ALL));
        assert!(perms.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_everyone_overwrite_applies() {
        let g = guild(
            vec![Overwrite {
                kind: OverwriteKind::Role,
                target: GUILD,
                allow: Permissions::ATTACH_FILES,
                deny: Permissions::SEND_MESSAGES,
            }],
            vec![],
        );
        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert!(!perms.contains(Permissions::SEND_MESSAGES));
        assert!(perms.contains(Permissions::ATTACH_FILES));
    }

    #[test]
    fn test_conflicting_role_overwrites_collected_not_sequential() {
        // One role allows SEND_MESSAGES, another denies it. Simultaneous
        // collection means the allow survives regardless of overwrite order.
        let g = guild(
            vec![
                Overwrite {
                    kind: OverwriteKind::Role,
                    target: MOD_ROLE,
                    allow: Permissions::SEND_MESSAGES,
                    deny: Permissions::empty(),
                },
                Overwrite {
                    kind: OverwriteKind::Role,
                    target: GUEST_ROLE,
                    allow: Permissions::empty(),
                    deny: Permissions::SEND_MESSAGES,
                },
            ],
            vec![MOD_ROLE, GUEST_ROLE],
        );
        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert!(perms.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_member_overwrite_beats_role_deny() {
        // Concrete case from the permission hierarchy: role denies
        // SEND_MESSAGES, a member-specific overwrite re-allows it.
        let g = guild(
            vec![
                Overwrite {
                    kind: OverwriteKind::Role,
                    target: MOD_ROLE,
                    allow: Permissions::empty(),
                    deny: Permissions::SEND_MESSAGES,
                },
                Overwrite {
                    kind: OverwriteKind::Member,
                    target: ALICE,
                    allow: Permissions::SEND_MESSAGES,
                    deny: Permissions::empty(),
                },
            ],
            vec![MOD_ROLE],
        );
        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert!(perms.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_unknown_overwrite_kind_skipped() {
        let g = guild(
            vec![Overwrite {
                kind: OverwriteKind::Unknown,
                target: ALICE,
                allow: Permissions::empty(),
                deny: Permissions::ALL,
            }],
            vec![],
        );
        let perms = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert!(perms.contains(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn test_resolver_deterministic() {
        let g = guild(vec![], vec![MOD_ROLE]);
        let a = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        let b = resolve_permissions(&g, ChannelId::new(CHANNEL), UserId::new(ALICE)).unwrap();
        assert_eq!(a, b);
    }
}
