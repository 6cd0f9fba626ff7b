//! Proptest generators for property-based testing.

use proptest::prelude::*;

use herald_core::{
    ChannelId, GuildId, Overwrite, OverwriteKind, Permissions, RoleId, UserId,
};

/// Generate a plausible snowflake (nonzero timestamp bits).
pub fn snowflake() -> impl Strategy<Value = u64> {
    (1u64 << 22)..(1u64 << 62)
}

/// Generate a random GuildId.
pub fn guild_id() -> impl Strategy<Value = GuildId> {
    snowflake().prop_map(GuildId::new)
}

/// Generate a random ChannelId.
pub fn channel_id() -> impl Strategy<Value = ChannelId> {
    snowflake().prop_map(ChannelId::new)
}

/// Generate a random UserId.
pub fn user_id() -> impl Strategy<Value = UserId> {
    snowflake().prop_map(UserId::new)
}

/// Generate a random RoleId.
pub fn role_id() -> impl Strategy<Value = RoleId> {
    snowflake().prop_map(RoleId::new)
}

/// Generate a permission mask drawn from the defined bits only.
pub fn permissions() -> impl Strategy<Value = Permissions> {
    any::<u64>().prop_map(|raw| Permissions::from_bits(raw & Permissions::ALL.bits()))
}

/// Generate an overwrite kind, including the unknown variant decoded from
/// unrecognized wire values.
pub fn overwrite_kind() -> impl Strategy<Value = OverwriteKind> {
    prop_oneof![
        Just(OverwriteKind::Role),
        Just(OverwriteKind::Member),
        Just(OverwriteKind::Unknown),
    ]
}

/// Generate an overwrite with an arbitrary target.
pub fn overwrite() -> impl Strategy<Value = Overwrite> {
    (overwrite_kind(), snowflake(), permissions(), permissions()).prop_map(
        |(kind, target, allow, deny)| Overwrite {
            kind,
            target,
            allow,
            deny,
        },
    )
}

/// Generate a valid shard count.
pub fn shard_count() -> impl Strategy<Value = u32> {
    1u32..=512
}
