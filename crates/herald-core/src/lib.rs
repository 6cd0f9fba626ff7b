//! # Herald Core
//!
//! Pure primitives for the Herald runtime: identifiers, the guild entity
//! model, permission resolution, and shard assignment.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over caller-supplied snapshots, so everything here is safe
//! to call concurrently without coordination.
//!
//! ## Key Types
//!
//! - [`GuildId`], [`ChannelId`], [`UserId`], [`RoleId`] - snowflake newtypes
//! - [`Guild`], [`Channel`], [`Role`], [`Member`], [`Overwrite`] - entity snapshots
//! - [`Permissions`] - the permission bitmask
//!
//! ## Key Operations
//!
//! - [`resolve_permissions`] - effective permission bitmask for a member in a channel
//! - [`shard_index`] - deterministic guild-to-shard partitioning

pub mod error;
pub mod model;
pub mod perms;
pub mod shard;
pub mod types;

pub use error::CoreError;
pub use model::{BotUser, Channel, Guild, Member, Message, Overwrite, OverwriteKind, Role};
pub use perms::{resolve_permissions, Permissions};
pub use shard::shard_index;
pub use types::{ChannelId, GuildId, RoleId, UserId};
