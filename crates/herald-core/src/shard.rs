//! Deterministic guild-to-shard partitioning.
//!
//! Snowflake ids put creation time in the high bits, so shifting off the
//! low 22 bits and taking the remainder spreads guilds evenly across
//! shards while keeping the assignment stable across restarts.

use crate::error::{CoreError, Result};
use crate::types::GuildId;

/// Compute the shard index that owns a guild.
///
/// Pure and side-effect free: identical inputs always produce identical
/// output, and the result is in `[0, num_shards)`. A shard count of zero
/// is a configuration error, not a division by zero.
pub fn shard_index(id: GuildId, num_shards: u32) -> Result<u32> {
    if num_shards == 0 {
        return Err(CoreError::InvalidShardCount);
    }
    Ok(((id.get() >> 22) % num_shards as u64) as u32)
}
