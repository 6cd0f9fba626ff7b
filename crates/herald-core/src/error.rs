//! Error types for Herald Core.

use thiserror::Error;

use crate::types::{ChannelId, GuildId, UserId};

/// Core errors that can occur during snapshot lookups and shard math.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("guild not found: {0}")]
    GuildNotFound(GuildId),

    #[error("channel not found: {0}")]
    ChannelNotFound(ChannelId),

    #[error("member not found: {0}")]
    MemberNotFound(UserId),

    #[error("shard count must be at least 1")]
    InvalidShardCount,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
