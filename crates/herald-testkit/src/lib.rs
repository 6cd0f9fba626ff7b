//! # Herald Testkit
//!
//! Testing utilities for the Herald runtime.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a guild-snapshot builder, shard-targeted snowflakes,
//!   and pre-seeded memory stores
//! - **Generators**: proptest strategies for ids, permission masks, and
//!   overwrites
//!
//! ## Fixtures
//!
//! Quickly assemble a guild snapshot:
//!
//! ```rust
//! use herald_testkit::fixtures::GuildFixture;
//! use herald_core::{GuildId, UserId, Permissions};
//!
//! let guild = GuildFixture::new(GuildId::new(1 << 22), UserId::new(1))
//!     .everyone_permissions(Permissions::SEND_MESSAGES)
//!     .role(10, "Mods", Permissions::KICK_MEMBERS)
//!     .channel(20, "general")
//!     .member(30, "alice", &[10])
//!     .build();
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use herald_testkit::generators::{guild_id, shard_count};
//!
//! proptest! {
//!     #[test]
//!     fn assignment_in_range(id in guild_id(), n in shard_count()) {
//!         prop_assert!(herald_core::shard_index(id, n).unwrap() < n);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    random_snowflake, seeded_guild_set, seeded_snapshots, snowflake_on_shard, GuildFixture,
};
